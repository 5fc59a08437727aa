//! Result types: per-document outcomes and run-level aggregates.

use crate::error::MigrationFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one migration unit.
///
/// Unique across the source inventory; used as the correlation key for all
/// artifacts and for the per-document remote directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Proof of a completed migration: where the three artifacts landed and the
/// custody digest binding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReceipt {
    /// The migrated document.
    pub doc_id: DocumentId,
    /// Number of pages extracted, packaged, and merged.
    pub page_count: usize,
    /// SHA-256 of the finalized custody archive, lowercase hex.
    pub custody_digest: String,
    /// Remote directory holding the three objects.
    pub remote_dir: String,
    /// Remote paths of the delivered objects, in upload order.
    pub objects: Vec<String>,
}

/// Terminal outcome of one document's pipeline run.
///
/// Exactly one `MigrationResult` is produced per submitted document; a
/// failure carries the stage it occurred in (see
/// [`MigrationFailure`]).
#[derive(Debug)]
pub struct MigrationResult {
    pub doc_id: DocumentId,
    pub outcome: Result<MigrationReceipt, MigrationFailure>,
    /// Wall-clock duration of the pipeline run in milliseconds.
    pub duration_ms: u64,
}

impl MigrationResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Aggregate statistics for one orchestrator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationStats {
    /// Documents submitted.
    pub total: usize,
    /// Documents that reached `Done`.
    pub succeeded: usize,
    /// Documents that terminated in `Failed`.
    pub failed: usize,
    /// Total pages delivered across successful documents.
    pub total_pages: usize,
    /// Wall-clock duration of the whole run in milliseconds.
    pub duration_ms: u64,
}

/// Everything an orchestrator run produced: one terminal result per document
/// plus aggregate stats.
#[derive(Debug)]
pub struct MigrationRun {
    pub results: Vec<MigrationResult>,
    pub stats: MigrationStats,
}

impl MigrationRun {
    /// Iterate over the failures only, for logging and alerting.
    pub fn failures(&self) -> impl Iterator<Item = (&DocumentId, &MigrationFailure)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|f| (&r.doc_id, f)))
    }
}
