//! Error types for the docmigrate library.
//!
//! Two layers reflect how failures surface to callers:
//!
//! * [`MigrateError`] — the **cause**: what actually went wrong (unparsable
//!   archive, undecodable page image, remote write refused, …).
//!
//! * [`MigrationFailure`] — the **terminal outcome** of one document's
//!   pipeline run: the cause bound to the [`Stage`] that was executing when
//!   it happened. Stored inside [`crate::output::MigrationResult`] so a
//!   caller can log, alert, and decide whether a retry makes sense without
//!   parsing error strings.
//!
//! A failure for one document never aborts sibling migrations; the
//! orchestrator collects one terminal result per document.

use std::io;
use thiserror::Error;

/// Pipeline stages of a single document migration.
///
/// Used to tag a [`MigrationFailure`] with the state machine position at the
/// moment of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    /// Obtaining archive bytes from the source collaborator.
    Fetching,
    /// Parsing the archive and collecting page images.
    Extracting,
    /// Building the chain-of-custody archive.
    Packaging,
    /// Building the merged PDF document.
    Merging,
    /// Computing the custody digest and composing metadata.
    Composing,
    /// Writing the three artifacts to the remote target.
    Uploading,
    /// Removing scoped temporary artifacts.
    Cleaning,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Packaging => "packaging",
            Stage::Merging => "merging",
            Stage::Composing => "composing",
            Stage::Uploading => "uploading",
            Stage::Cleaning => "cleaning",
        };
        f.write_str(s)
    }
}

/// All error causes produced by the docmigrate library.
#[derive(Debug, Error)]
pub enum MigrateError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// The source collaborator could not deliver the archive bytes.
    #[error("Failed to fetch archive for '{doc_id}': {reason}")]
    Fetch { doc_id: String, reason: String },

    // ── Archive errors ────────────────────────────────────────────────────
    /// The inbound byte stream is not a parsable ZIP container.
    #[error("Archive is not a valid ZIP container: {detail}")]
    InvalidArchive { detail: String },

    /// The archive parsed but contained zero entries with a recognized
    /// raster-page suffix.
    #[error("No page images found in archive (recognized suffixes: {suffixes})")]
    NoPagesFound { suffixes: String },

    // ── Page errors ───────────────────────────────────────────────────────
    /// A page payload could not be decoded as a raster image.
    #[error("Page {page} ('{name}') cannot be decoded as an image: {detail}")]
    UnsupportedImageFormat {
        page: usize,
        name: String,
        detail: String,
    },

    // ── Artifact build errors ─────────────────────────────────────────────
    /// Local I/O or encoder failure while writing the custody archive.
    #[error("Failed to build custody archive: {detail}")]
    Packaging { detail: String },

    /// Local I/O or encoder failure while writing the merged PDF.
    #[error("Failed to build merged document: {detail}")]
    Merge { detail: String },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// A remote write failed. Objects written before the failure are left
    /// in place for manual reconciliation; the run is reported failed.
    #[error("Remote write failed for '{object}': {reason}")]
    Upload { object: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (task panic, temp-dir creation, …).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MigrateError {
    /// Wrap a local I/O or encoder error as a packaging failure.
    pub(crate) fn packaging(e: impl std::fmt::Display) -> Self {
        MigrateError::Packaging {
            detail: e.to_string(),
        }
    }

    /// Wrap a local I/O or PDF writer error as a merge failure.
    pub(crate) fn merge(e: impl std::fmt::Display) -> Self {
        MigrateError::Merge {
            detail: e.to_string(),
        }
    }
}

impl From<io::Error> for MigrateError {
    fn from(e: io::Error) -> Self {
        MigrateError::Internal(format!("I/O error: {e}"))
    }
}

/// Terminal failure of one document's migration: which stage failed and why.
///
/// Never represents a partially committed run as success — `Uploading`
/// failures carry the name of the object that could not be written even when
/// sibling objects already landed.
#[derive(Debug, Error)]
#[error("Migration failed at {stage} stage: {cause}")]
pub struct MigrationFailure {
    /// State machine position at the moment of failure.
    pub stage: Stage,
    /// The underlying cause.
    #[source]
    pub cause: MigrateError,
}

impl MigrationFailure {
    pub fn new(stage: Stage, cause: MigrateError) -> Self {
        Self { stage, cause }
    }
}
