//! Per-document delivery coordinator: the migration state machine.
//!
//! One call to [`migrate_document`] drives a single document through
//!
//! ```text
//! Fetching → Extracting → (Packaging ∥ Merging) → Composing → Uploading → Cleaning → Done
//! ```
//!
//! with `Failed(stage, cause)` reachable from every non-terminal state.
//!
//! ## Artifact lifecycle
//!
//! Both local artifacts are staged inside one [`tempfile::TempDir`] owned by
//! the run. `TempDir` removes the directory on drop, which covers every exit
//! path — success, stage failure, panic, and cancellation of the future at
//! an await point. There are no manual delete calls to forget.
//!
//! ## Packaging ∥ Merging
//!
//! The two artifact builders are independent consumers of the same immutable
//! page sequence, so they run concurrently on blocking threads
//! (`spawn_blocking`, both are CPU-bound). Composing strictly waits for
//! Packaging: the metadata digest is computed from the custody archive's
//! finalized staged bytes, never from an intermediate buffer.

use crate::config::MigrationConfig;
use crate::error::{MigrateError, MigrationFailure, Stage};
use crate::output::{DocumentId, MigrationReceipt, MigrationResult};
use crate::pipeline::{compose, custody, extract, merge};
use crate::remote::RemoteTarget;
use crate::source::DocumentSource;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Remote object name of the custody archive.
pub const CHAIN_OBJECT: &str = "chain.zip";
/// Remote object name of the merged document.
pub const DOCUMENT_OBJECT: &str = "document.pdf";
/// Remote object name of the metadata descriptor.
pub const META_OBJECT: &str = "meta.xml";

/// Migrate one document end to end.
///
/// Always returns a terminal [`MigrationResult`] — success with the remote
/// receipt, or the failing stage and cause. Errors never escape as panics,
/// and a failure here never affects sibling in-flight documents.
pub async fn migrate_document(
    id: DocumentId,
    source: Arc<dyn DocumentSource>,
    target: Arc<dyn RemoteTarget>,
    config: &MigrationConfig,
) -> MigrationResult {
    let start = Instant::now();
    info!("Starting migration of '{id}'");

    let outcome = run_pipeline(&id, source, target, config).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match &outcome {
        Ok(receipt) => info!(
            "Completed '{}' ({} pages, {}ms)",
            id, receipt.page_count, duration_ms
        ),
        Err(failure) => warn!("Migration of '{id}' failed: {failure}"),
    }

    MigrationResult {
        doc_id: id,
        outcome,
        duration_ms,
    }
}

async fn run_pipeline(
    id: &DocumentId,
    source: Arc<dyn DocumentSource>,
    target: Arc<dyn RemoteTarget>,
    config: &MigrationConfig,
) -> Result<MigrationReceipt, MigrationFailure> {
    // ── Fetching ─────────────────────────────────────────────────────────
    let archive = source
        .fetch_archive(id)
        .await
        .map_err(|e| MigrationFailure::new(Stage::Fetching, e))?;
    debug!("Fetched {} bytes for '{id}'", archive.len());

    // ── Extracting ───────────────────────────────────────────────────────
    let extensions = config.page_extensions.clone();
    let pages = tokio::task::spawn_blocking(move || extract::extract_pages(&archive, &extensions))
        .await
        .map_err(|e| task_panicked(Stage::Extracting, e))?
        .map_err(|e| MigrationFailure::new(Stage::Extracting, e))?;
    let page_count = pages.len();
    info!("Extracted {page_count} pages from '{id}'");

    // Immutable page sequence shared by both artifact builders.
    let pages = Arc::new(pages);

    // Scoped temp storage for the run's artifacts.
    let workdir = match config.workdir_root.as_deref() {
        Some(root) => TempDir::new_in(root),
        None => TempDir::new(),
    }
    .map_err(|e| MigrationFailure::new(Stage::Packaging, MigrateError::packaging(e)))?;
    let chain_path = workdir.path().join(CHAIN_OBJECT);
    let pdf_path = workdir.path().join(DOCUMENT_OBJECT);

    // ── Packaging ∥ Merging ──────────────────────────────────────────────
    let pack_task = {
        let id = id.clone();
        let pages = Arc::clone(&pages);
        let chain_path = chain_path.clone();
        tokio::task::spawn_blocking(move || stage_custody(&id, &pages, &chain_path))
    };
    let merge_task = {
        let pages = Arc::clone(&pages);
        let pdf_path = pdf_path.clone();
        tokio::task::spawn_blocking(move || stage_merged(&pages, &pdf_path))
    };

    let (packed, merged) = tokio::join!(pack_task, merge_task);
    packed
        .map_err(|e| task_panicked(Stage::Packaging, e))?
        .map_err(|e| MigrationFailure::new(Stage::Packaging, e))?;
    merged
        .map_err(|e| task_panicked(Stage::Merging, e))?
        .map_err(|e| MigrationFailure::new(Stage::Merging, e))?;

    // ── Composing ────────────────────────────────────────────────────────
    // The custody archive is read back from the staged file so the digest
    // provably covers the finalized bytes.
    let chain_bytes =
        read_staged(&chain_path, Stage::Composing, |e| MigrateError::packaging(e)).await?;
    let metadata = compose::compose_from_custody(id, page_count, &chain_bytes);
    let custody_digest = metadata.custody_digest.clone();
    debug!("Composed metadata for '{id}': digest {custody_digest}");

    // ── Uploading ────────────────────────────────────────────────────────
    let pdf_bytes = read_staged(&pdf_path, Stage::Uploading, |e| MigrateError::merge(e)).await?;
    let remote_dir = format!("{}/{}", config.remote_root.trim_end_matches('/'), id);
    let objects = upload(
        &*target,
        &remote_dir,
        &chain_bytes,
        &pdf_bytes,
        metadata.to_xml().as_bytes(),
    )
    .await
    .map_err(|e| MigrationFailure::new(Stage::Uploading, e))?;

    // ── Cleaning ─────────────────────────────────────────────────────────
    debug!("Cleaning scoped artifacts for '{id}'");
    drop(workdir);

    Ok(MigrationReceipt {
        doc_id: id.clone(),
        page_count,
        custody_digest,
        remote_dir,
        objects,
    })
}

/// Build the custody archive and stage it into the workdir.
fn stage_custody(
    id: &DocumentId,
    pages: &[extract::PageImage],
    path: &Path,
) -> Result<(), MigrateError> {
    let bytes = custody::pack(id, pages)?;
    std::fs::write(path, bytes).map_err(MigrateError::packaging)
}

/// Build the merged PDF and stage it into the workdir.
fn stage_merged(pages: &[extract::PageImage], path: &Path) -> Result<(), MigrateError> {
    let bytes = merge::merge(pages)?;
    std::fs::write(path, bytes).map_err(MigrateError::merge)
}

/// Read a staged artifact back. A failure here is local artifact I/O, so it
/// is bound to `stage` with the artifact's own error kind, not as a remote
/// or internal error.
async fn read_staged(
    path: &Path,
    stage: Stage,
    wrap: fn(std::io::Error) -> MigrateError,
) -> Result<Vec<u8>, MigrationFailure> {
    tokio::fs::read(path)
        .await
        .map_err(|e| MigrationFailure::new(stage, wrap(e)))
}

/// Deliver the three objects into `remote_dir`.
///
/// All three writes must succeed for the document to be committed. On a
/// failed write, objects already written stay in place for manual
/// reconciliation — deterministic re-runs overwrite them with identical
/// content — and the run terminates as an `Uploading` failure.
async fn upload(
    target: &dyn RemoteTarget,
    remote_dir: &str,
    chain: &[u8],
    pdf: &[u8],
    meta: &[u8],
) -> Result<Vec<String>, MigrateError> {
    target.ensure_directory(remote_dir).await?;

    let mut delivered = Vec::with_capacity(3);
    for (name, bytes) in [
        (CHAIN_OBJECT, chain),
        (DOCUMENT_OBJECT, pdf),
        (META_OBJECT, meta),
    ] {
        let path = format!("{remote_dir}/{name}");
        target.write_object(&path, bytes).await?;
        debug!("Delivered {path} ({} bytes)", bytes.len());
        delivered.push(path);
    }
    Ok(delivered)
}

fn task_panicked(stage: Stage, e: tokio::task::JoinError) -> MigrationFailure {
    MigrationFailure::new(stage, MigrateError::Internal(format!("task panicked: {e}")))
}
