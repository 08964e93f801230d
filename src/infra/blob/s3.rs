use anyhow::{Context, Result};
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

use super::{BlobStore, ConnectionString};

/// Blob store backed by an S3-compatible service.
///
/// Containers map to buckets and blob names to object keys. Path-style
/// addressing is forced so local emulators work without DNS tricks.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
}

impl S3BlobStore {
    pub async fn connect(conn: &ConnectionString) -> Self {
        let credentials = Credentials::new(
            conn.access_key_id.clone(),
            conn.secret_access_key.clone(),
            None,
            None,
            "connection-string",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(conn.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &conn.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        debug!(endpoint = ?conn.endpoint, region = %conn.region, "S3 blob store configured");

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, container: &str, blob: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(container)
            .key(blob)
            .send()
            .await
            .with_context(|| format!("GetObject failed for '{container}/{blob}'"))?;

        let body = resp
            .body
            .collect()
            .await
            .with_context(|| format!("reading body of '{container}/{blob}'"))?;

        Ok(body.into_bytes())
    }

    async fn put(&self, container: &str, blob: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(container)
            .key(blob)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("PutObject failed for '{container}/{blob}'"))?;

        Ok(())
    }
}
