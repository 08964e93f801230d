//! Input byte streams: local files, HTTP URLs and blobs.

mod http;

pub use http::{BasicClient, HttpClient};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use tracing::debug;

use crate::error::PipelineError;
use crate::infra::blob::BlobStore;

const BLOB_SCHEME: &str = "blob://";

/// Where the dataset bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Http(String),
    Blob { container: String, blob: String },
}

impl Source {
    pub fn blob(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Source::Blob {
            container: container.into(),
            blob: blob.into(),
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Source::Blob { .. })
    }
}

impl FromStr for Source {
    type Err = PipelineError;

    /// `blob://<container>/<blob>`, `http(s)://...`, or a file path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(BLOB_SCHEME) {
            return match rest.split_once('/') {
                Some((container, blob)) if !container.is_empty() && !blob.is_empty() => {
                    Ok(Source::blob(container, blob))
                }
                _ => Err(PipelineError::Configuration(format!(
                    "blob source '{s}' must look like blob://<container>/<blob>"
                ))),
            };
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Source::Http(s.to_string()));
        }
        Ok(Source::File(PathBuf::from(s)))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Http(url) => write!(f, "{url}"),
            Source::Blob { container, blob } => write!(f, "{BLOB_SCHEME}{container}/{blob}"),
        }
    }
}

/// Downloads `url` through `client`.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    let resp = client.execute(req).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Reads the whole input named by `source`.
///
/// `blobs` is only consulted for [`Source::Blob`]; passing `None` there is a
/// configuration error.
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn read_source(
    source: &Source,
    http: &dyn HttpClient,
    blobs: Option<&dyn BlobStore>,
) -> std::result::Result<Vec<u8>, PipelineError> {
    let fetch_error = |reason: String| PipelineError::Fetch {
        source_name: source.to_string(),
        reason,
    };

    let bytes = match source {
        Source::File(path) => std::fs::read(path).map_err(|e| fetch_error(e.to_string()))?,
        Source::Http(url) => fetch_bytes(http, url)
            .await
            .map_err(|e| fetch_error(format!("{e:#}")))?,
        Source::Blob { container, blob } => {
            let store = blobs.ok_or_else(|| {
                PipelineError::Configuration(format!("no blob store configured for {source}"))
            })?;
            store
                .get(container, blob)
                .await
                .map_err(|e| fetch_error(format!("{e:#}")))?
                .to_vec()
        }
    };

    debug!(bytes = bytes.len(), "Source read");
    Ok(bytes)
}
