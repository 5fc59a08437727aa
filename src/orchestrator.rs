//! Migration orchestrator: enumerate documents and drive pipelines with
//! bounded concurrency.
//!
//! ## Concurrency model
//!
//! Documents are independent, concurrently schedulable units. The
//! orchestrator submits at most `config.concurrency` pipelines at once via
//! `buffer_unordered` — the limit protects the source service and the remote
//! session pool, the only genuinely shared resources of a run. No ordering
//! is guaranteed across documents; every submitted document reaches exactly
//! one terminal [`MigrationResult`], and one document's failure never
//! aborts its siblings.
//!
//! ## Retry policy
//!
//! The core never retries internally. A caller (or its job scheduler) may
//! re-submit a failed document id: packaging and merging are deterministic,
//! so a re-run overwrites any partially delivered objects with identical
//! content and republishes the same custody digest.

use crate::config::MigrationConfig;
use crate::error::MigrateError;
use crate::migrate::migrate_document;
use crate::output::{DocumentId, MigrationResult, MigrationRun, MigrationStats};
use crate::remote::RemoteTarget;
use crate::source::DocumentSource;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of terminal per-document results, in completion order.
pub type ResultStream = Pin<Box<dyn Stream<Item = MigrationResult> + Send>>;

/// Run a full migration: enumerate every pending document from the source
/// inventory and migrate each one.
///
/// # Errors
/// `Err` only when the inventory itself cannot be listed. Per-document
/// failures are collected inside the returned [`MigrationRun`].
pub async fn run_migration(
    source: Arc<dyn DocumentSource>,
    target: Arc<dyn RemoteTarget>,
    config: &MigrationConfig,
) -> Result<MigrationRun, MigrateError> {
    let ids = source.list_pending_documents().await?;
    info!("Inventory lists {} pending documents", ids.len());
    Ok(migrate_documents(ids, source, target, config).await)
}

/// Migrate an explicit list of documents with bounded concurrency and
/// collect one terminal result per document.
pub async fn migrate_documents(
    ids: Vec<DocumentId>,
    source: Arc<dyn DocumentSource>,
    target: Arc<dyn RemoteTarget>,
    config: &MigrationConfig,
) -> MigrationRun {
    let start = Instant::now();
    let total = ids.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let results: Vec<MigrationResult> = stream::iter(ids.into_iter().map(|id| {
        let source = Arc::clone(&source);
        let target = Arc::clone(&target);
        let config = config.clone();
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_start(&id);
            }
            let result = migrate_document(id, source, target, &config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result.outcome {
                    Ok(receipt) => cb.on_document_complete(&result.doc_id, receipt.page_count),
                    Err(failure) => cb.on_document_failed(&result.doc_id, failure),
                }
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    let stats = MigrationStats {
        total,
        succeeded,
        failed: total - succeeded,
        total_pages: results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|x| x.page_count))
            .sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Migration run complete: {}/{} documents succeeded in {}ms",
        succeeded, total, stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, succeeded);
    }

    MigrationRun { results, stats }
}

/// Migrate documents, streaming each terminal result as its pipeline
/// finishes.
///
/// Results arrive in completion order, not submission order; at most
/// `config.concurrency` pipelines are in flight. Use this instead of
/// [`migrate_documents`] to log or persist outcomes progressively on large
/// inventories.
pub fn migrate_stream(
    ids: Vec<DocumentId>,
    source: Arc<dyn DocumentSource>,
    target: Arc<dyn RemoteTarget>,
    config: &MigrationConfig,
) -> ResultStream {
    let concurrency = config.concurrency;
    let config = config.clone();

    Box::pin(
        stream::iter(ids.into_iter().map(move |id| {
            let source = Arc::clone(&source);
            let target = Arc::clone(&target);
            let config = config.clone();
            async move { migrate_document(id, source, target, &config).await }
        }))
        .buffer_unordered(concurrency),
    )
}
