//! Lock-registry listing client.
//!
//! The registry returns recent lock entries as JSON, either as a bare
//! array or wrapped in an object under `data`, `items` or `locks`. Entries
//! are passed through untouched; interpretation belongs to the extractor.

use crate::error::{UpstreamError, UpstreamResult};
use crate::http::HttpTransport;
use tracing::{debug, instrument};

/// Wrapper keys probed when the listing is an object.
const LIST_KEYS: [&str; 3] = ["data", "items", "locks"];

/// Client for a lock-registry listing endpoint.
pub struct RegistryClient {
    transport: HttpTransport,
    url: String,
}

impl RegistryClient {
    /// Create a new client for the listing URL.
    pub fn new(url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// Fetch the most recent lock entries.
    #[instrument(skip(self))]
    pub async fn recent_locks(&self, limit: usize) -> UpstreamResult<Vec<serde_json::Value>> {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}limit={}", self.url, separator, limit);

        let body: serde_json::Value = self.transport.get_json(&url).await?;
        let mut entries = extract_entries(body)?;
        entries.truncate(limit);

        debug!(count = entries.len(), "Fetched lock registry entries");
        Ok(entries)
    }
}

fn extract_entries(body: serde_json::Value) -> UpstreamResult<Vec<serde_json::Value>> {
    match body {
        serde_json::Value::Array(entries) => Ok(entries),
        serde_json::Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(serde_json::Value::Array(entries)) => Some(entries),
                _ => None,
            })
            .ok_or_else(|| {
                UpstreamError::Malformed("registry listing has no entry array".to_string())
            }),
        _ => Err(UpstreamError::Malformed(
            "registry listing is not an array or object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_entries_shapes() {
        assert_eq!(extract_entries(json!([{"id": 1}])).unwrap().len(), 1);
        assert_eq!(
            extract_entries(json!({"data": [{"id": 1}, {"id": 2}]}))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            extract_entries(json!({"locks": []})).unwrap().len(),
            0
        );
    }

    #[test]
    fn test_extract_entries_malformed() {
        assert!(extract_entries(json!({"count": 3})).is_err());
        assert!(extract_entries(json!("nope")).is_err());
    }
}
