//! Blob storage access.
//!
//! [`ConnectionString`] parses the store credentials from configuration.
//! [`BlobStore`] is the async trait for reading and writing blobs by
//! container and name. [`S3BlobStore`] implements it for any S3-compatible
//! endpoint.

mod config;
#[cfg(test)]
pub(crate) mod memory;
mod s3;

pub use config::ConnectionString;
pub use s3::S3BlobStore;

use anyhow::Result;
use bytes::Bytes;

/// Byte-stream provider keyed by container and blob name.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, container: &str, blob: &str) -> Result<Bytes>;

    async fn put(&self, container: &str, blob: &str, body: Vec<u8>, content_type: &str) -> Result<()>;
}
