//! Progress-callback trait for per-document migration events.
//!
//! Inject an [`Arc<dyn MigrationProgressCallback>`] via
//! [`crate::config::MigrationConfigBuilder::progress_callback`] to receive
//! real-time events as documents complete.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a database record, or a terminal
//! progress bar without the library knowing how the host application
//! communicates. The trait is `Send + Sync` because documents migrate
//! concurrently; implementations must synchronise their own mutable state.

use crate::error::MigrationFailure;
use crate::output::DocumentId;
use std::sync::Arc;

/// Called by the orchestrator as documents move through the run.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_document_*` methods may be called concurrently
/// from different worker tasks.
pub trait MigrationProgressCallback: Send + Sync {
    /// Called once before any document is submitted.
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document's pipeline begins fetching.
    fn on_document_start(&self, doc_id: &DocumentId) {
        let _ = doc_id;
    }

    /// Called when a document reaches `Done`.
    fn on_document_complete(&self, doc_id: &DocumentId, page_count: usize) {
        let _ = (doc_id, page_count);
    }

    /// Called when a document terminates in `Failed`.
    fn on_document_failed(&self, doc_id: &DocumentId, failure: &MigrationFailure) {
        let _ = (doc_id, failure);
    }

    /// Called once after every document has a terminal result.
    fn on_run_complete(&self, total_documents: usize, succeeded: usize) {
        let _ = (total_documents, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl MigrationProgressCallback for NoopProgressCallback {}

/// Convenience alias for the injected callback type.
pub type ProgressCallback = Arc<dyn MigrationProgressCallback>;
