use std::collections::HashMap;

use crate::config::CONNECTION_STRING_VAR;
use crate::error::{PipelineError, Result};

const DEFAULT_REGION: &str = "us-east-1";

/// Credentials and endpoint of the blob store.
///
/// Stored as `key=value` pairs separated by semicolons, keys case-insensitive:
/// ```text
/// Endpoint=http://127.0.0.1:9000;AccessKeyId=minio;SecretAccessKey=minio123;Region=us-east-1
/// ```
/// `Endpoint` is optional (the provider default is used) and `Region`
/// defaults to `us-east-1`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl ConnectionString {
    /// Reads and parses [`CONNECTION_STRING_VAR`].
    ///
    /// # Errors
    ///
    /// A missing or empty variable is a configuration error, never a silent skip.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(CONNECTION_STRING_VAR).unwrap_or_default();
        if raw.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "{CONNECTION_STRING_VAR} not set"
            )));
        }
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries: HashMap<String, String> = HashMap::new();
        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "malformed connection string entry '{pair}'"
                ))
            })?;
            entries.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let mut required = |key: &str| {
            entries
                .remove(&key.to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    PipelineError::Configuration(format!("connection string is missing {key}"))
                })
        };
        let access_key_id = required("AccessKeyId")?;
        let secret_access_key = required("SecretAccessKey")?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            endpoint: entries.remove("endpoint").filter(|v| !v.is_empty()),
            region: entries
                .remove("region")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let conn = ConnectionString::parse(
            "Endpoint=http://127.0.0.1:9000;AccessKeyId=minio;SecretAccessKey=s3cr=t;Region=eu-west-1;",
        )
        .unwrap();

        assert_eq!(conn.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(conn.access_key_id, "minio");
        assert_eq!(conn.secret_access_key, "s3cr=t");
        assert_eq!(conn.region, "eu-west-1");
    }

    #[test]
    fn test_parse_defaults_and_case_insensitive_keys() {
        let conn = ConnectionString::parse("accesskeyid=a; SECRETACCESSKEY=b").unwrap();
        assert_eq!(conn.endpoint, None);
        assert_eq!(conn.region, "us-east-1");
    }

    #[test]
    fn test_parse_missing_secret() {
        let err = ConnectionString::parse("AccessKeyId=a").unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("SecretAccessKey"));
    }

    #[test]
    fn test_parse_malformed_entry() {
        assert!(ConnectionString::parse("AccessKeyId=a;garbage").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let conn = ConnectionString::parse("AccessKeyId=a;SecretAccessKey=topsecret").unwrap();
        assert!(!format!("{conn:?}").contains("topsecret"));
    }
}
