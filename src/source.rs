//! Source collaborators: inventory listing and archive fetch.
//!
//! The pipeline consumes the source system through [`DocumentSource`] only.
//! Transport details — base URLs, bearer tokens, connection pooling — live
//! entirely inside an implementation; the coordinator sees opaque archive
//! bytes or a `Fetch` error. Transient network failures are *not* retried
//! here: retry policy belongs to whoever re-submits the document, which is
//! safe because the whole pipeline is idempotent.

use crate::error::MigrateError;
use crate::output::DocumentId;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// The source inventory and payload service, seen from the pipeline.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Enumerate the documents awaiting migration.
    async fn list_pending_documents(&self) -> Result<Vec<DocumentId>, MigrateError>;

    /// Fetch the raw archive bytes (a ZIP of page scans) for one document.
    async fn fetch_archive(&self, id: &DocumentId) -> Result<Vec<u8>, MigrateError>;
}

/// REST source: `GET {base_url}/documents` for the inventory and
/// `GET {base_url}/documents/{id}/payload` for archive bytes, with optional
/// bearer authentication.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpSource {
    /// Build an HTTP source against `base_url`.
    ///
    /// # Errors
    /// [`MigrateError::Internal`] if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, MigrateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MigrateError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(ref token) = self.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn fetch_bytes(&self, url: String, doc_id: &str) -> Result<Vec<u8>, MigrateError> {
        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| MigrateError::Fetch {
                doc_id: doc_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(MigrateError::Fetch {
                doc_id: doc_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| MigrateError::Fetch {
            doc_id: doc_id.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn list_pending_documents(&self) -> Result<Vec<DocumentId>, MigrateError> {
        let url = format!("{}/documents", self.base_url);
        info!("Listing pending documents from {url}");

        let bytes = self.fetch_bytes(url, "<inventory>").await?;
        let ids: Vec<String> =
            serde_json::from_slice(&bytes).map_err(|e| MigrateError::Fetch {
                doc_id: "<inventory>".into(),
                reason: format!("inventory response is not a JSON id list: {e}"),
            })?;

        debug!("Inventory returned {} pending documents", ids.len());
        Ok(ids.into_iter().map(DocumentId::from).collect())
    }

    async fn fetch_archive(&self, id: &DocumentId) -> Result<Vec<u8>, MigrateError> {
        let url = format!("{}/documents/{}/payload", self.base_url, id);
        debug!("Fetching archive for '{id}' from {url}");

        let bytes = self.fetch_bytes(url, id.as_str()).await?;
        info!("Fetched archive for '{}' ({} bytes)", id, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let s = HttpSource::new("http://localhost:8081/", None, 5).unwrap();
        assert_eq!(s.base_url, "http://localhost:8081");
    }
}
