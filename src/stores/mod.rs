//! Capability interfaces for the two backing stores and their implementations.
//!
//! The coordinator only sees `dyn BlobStore` and `dyn MetadataStore`; the
//! concrete backends are picked in `main`.

pub mod blob;
pub mod local_blob;
pub mod memory;
pub mod metadata;
pub mod sqlite_metadata;
