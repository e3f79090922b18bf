use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod stores;

use routes::routes::AppState;
use services::storage_service::StorageService;
use stores::{
    blob::BlobStore,
    local_blob::LocalBlobStore,
    memory::{InMemoryBlobStore, InMemoryMetadataStore},
    metadata::MetadataStore,
    sqlite_metadata::SqliteMetadataStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        addr = %cfg.addr(),
        container = %cfg.container,
        blob_dir = %cfg.blob_dir,
        database_url = %cfg.database_url,
        in_memory = cfg.in_memory,
        "Starting file-vault"
    );

    let (blobs, metadata, local_blobs) = if cfg.in_memory {
        tracing::warn!("Running with in-memory stores; nothing is persisted");
        let blobs: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
        let metadata: Arc<dyn MetadataStore> = Arc::new(InMemoryMetadataStore::new());
        (blobs, metadata, None)
    } else {
        let sqlite = open_metadata_store(&cfg.database_url).await?;
        sqlite.migrate().await?;

        // --- Handle migration mode ---
        if migrate {
            tracing::info!("Database migration complete.");
            return Ok(()); // exit after migration
        }

        // --- Ensure blob directory exists ---
        if !Path::new(&cfg.blob_dir).exists() {
            fs::create_dir_all(&cfg.blob_dir)?;
            tracing::info!("Created blob directory at {}", cfg.blob_dir);
        }
        let local = Arc::new(LocalBlobStore::new(
            &cfg.blob_dir,
            cfg.public_base_url.clone(),
            cfg.signing_secret.as_bytes().to_vec(),
        ));
        let blobs: Arc<dyn BlobStore> = local.clone();
        let metadata: Arc<dyn MetadataStore> = Arc::new(sqlite);
        (blobs, metadata, Some(local))
    };

    // --- Initialize core service ---
    let storage = StorageService::new(cfg.coordinator(), blobs, metadata);

    // --- Build router ---
    let max_upload = usize::try_from(cfg.max_upload_bytes.max(0))?;
    let app: Router = routes::routes::routes(max_upload, cfg.request_timeout, &cfg.allowed_origins)
        .with_state(AppState {
            storage,
            local_blobs,
        });

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect to SQLite, creating the database file and its parent directory on first run.
async fn open_metadata_store(db_url: &str) -> Result<SqliteMetadataStore> {
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let options = db_url
        .parse::<sqlx::sqlite::SqliteConnectOptions>()?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(SqliteMetadataStore::new(Arc::new(pool)))
}
