use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};
use url::Url;

/// Upload ceiling: 50 MiB.
pub const DEFAULT_MAX_OBJECT_BYTES: i64 = 50 * 1024 * 1024;

/// Lifetime of preview URLs attached to listings.
pub const DEFAULT_PREVIEW_TTL: Duration = Duration::from_secs(30 * 60);

pub const DEFAULT_ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Settings the storage coordinator needs, passed in explicitly at
/// construction so tests can build one without touching the environment.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Blob store container (bucket) every object is written to.
    pub container: String,
    pub max_object_bytes: i64,
    pub allowed_content_types: Vec<String>,
    pub preview_ttl: Duration,
}

impl CoordinatorConfig {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            max_object_bytes: DEFAULT_MAX_OBJECT_BYTES,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview_ttl: DEFAULT_PREVIEW_TTL,
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub blob_dir: String,
    pub database_url: String,
    pub container: String,
    pub public_base_url: Url,
    pub signing_secret: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: i64,
    pub in_memory: bool,
    /// Browser origins allowed by CORS; empty allows any origin.
    pub allowed_origins: Vec<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-tenant file vault API")]
pub struct Args {
    /// Host to bind to (overrides FILE_VAULT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_VAULT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where blob payloads are stored (overrides FILE_VAULT_BLOB_DIR)
    #[arg(long)]
    pub blob_dir: Option<String>,

    /// Metadata database URL (overrides FILE_VAULT_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Blob container name (overrides FILE_VAULT_CONTAINER)
    #[arg(long)]
    pub container: Option<String>,

    /// Externally reachable base URL used in presigned links (overrides FILE_VAULT_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Request timeout in seconds (overrides FILE_VAULT_REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Per-file upload ceiling in bytes (overrides FILE_VAULT_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<i64>,

    /// Comma-separated CORS origins (overrides FILE_VAULT_ALLOWED_ORIGINS)
    #[arg(long)]
    pub allowed_origins: Option<String>,

    /// Keep both stores in memory; nothing survives a restart
    #[arg(long)]
    pub in_memory: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

/// Read and parse an environment variable, falling back to `default` when unset.
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// The signing secret is only needed when presigned URLs are served from local disk.
fn resolve_signing_secret(in_memory: bool, secret: Option<String>) -> Result<String> {
    match secret {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ if in_memory => Ok(String::new()),
        _ => bail!("FILE_VAULT_SIGNING_SECRET must be set to sign access URLs"),
    }
}

fn check_modes(in_memory: bool, migrate: bool) -> Result<()> {
    if in_memory && migrate {
        bail!("--migrate has no effect with --in-memory; drop one of the flags");
    }
    Ok(())
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        check_modes(args.in_memory, args.migrate)?;

        // --- Environment fallback ---
        let env_host = env::var("FILE_VAULT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parse("FILE_VAULT_PORT", 8080u16)?;
        let env_blob_dir =
            env::var("FILE_VAULT_BLOB_DIR").unwrap_or_else(|_| "./data/blobs".into());
        let env_db = env::var("FILE_VAULT_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/file_vault.db".into());
        let env_container =
            env::var("FILE_VAULT_CONTAINER").unwrap_or_else(|_| "user-storage".into());
        let env_timeout = env_parse("FILE_VAULT_REQUEST_TIMEOUT_SECS", 30u64)?;
        let env_max_upload = env_parse("FILE_VAULT_MAX_UPLOAD_BYTES", DEFAULT_MAX_OBJECT_BYTES)?;
        let signing_secret =
            resolve_signing_secret(args.in_memory, env::var("FILE_VAULT_SIGNING_SECRET").ok())?;
        let allowed_origins = args
            .allowed_origins
            .or_else(|| env::var("FILE_VAULT_ALLOWED_ORIGINS").ok())
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        // --- Merge ---
        let host = args.host.unwrap_or(env_host);
        let port = args.port.unwrap_or(env_port);
        let public_url = match args.public_url.or_else(|| env::var("FILE_VAULT_PUBLIC_URL").ok()) {
            Some(url) => url,
            None => format!("http://127.0.0.1:{}", port),
        };
        let public_base_url = Url::parse(&public_url)
            .with_context(|| format!("parsing public URL `{}`", public_url))?;

        let cfg = Self {
            host,
            port,
            blob_dir: args.blob_dir.unwrap_or(env_blob_dir),
            database_url: args.database_url.unwrap_or(env_db),
            container: args.container.unwrap_or(env_container),
            public_base_url,
            signing_secret,
            request_timeout: Duration::from_secs(args.request_timeout_secs.unwrap_or(env_timeout)),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            in_memory: args.in_memory,
            allowed_origins,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        let mut coordinator = CoordinatorConfig::new(self.container.clone());
        coordinator.max_object_bytes = self.max_upload_bytes;
        coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_defaults() {
        let cfg = CoordinatorConfig::new("vault");
        assert_eq!(cfg.container, "vault");
        assert_eq!(cfg.max_object_bytes, 52_428_800);
        assert_eq!(cfg.preview_ttl, Duration::from_secs(1800));
        assert!(cfg.allowed_content_types.iter().any(|t| t == "application/pdf"));
        assert!(!cfg.allowed_content_types.iter().any(|t| t == "text/plain"));
    }

    #[test]
    fn env_parse_uses_default_when_unset() {
        let value: u16 = env_parse("FILE_VAULT_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins(" http://localhost:3000, ,https://app.example.com "),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn signing_secret_required_only_for_disk_mode() {
        assert!(resolve_signing_secret(false, None).is_err());
        assert!(resolve_signing_secret(false, Some(String::new())).is_err());
        assert_eq!(resolve_signing_secret(false, Some("s3cret".into())).unwrap(), "s3cret");
        assert_eq!(resolve_signing_secret(true, None).unwrap(), "");
    }

    #[test]
    fn migrate_with_in_memory_is_rejected() {
        assert!(check_modes(true, true).is_err());
        assert!(check_modes(true, false).is_ok());
        assert!(check_modes(false, true).is_ok());
    }
}
