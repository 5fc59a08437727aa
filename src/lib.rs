//! # docmigrate
//!
//! Migrate scanned multi-page document archives from a REST inventory into
//! durable, auditable packages on a remote storage target.
//!
//! ## Why this crate?
//!
//! Legacy scan archives arrive as ZIPs of raster page images with no
//! integrity trail. Compliance migration needs more than a copy: each
//! document must become a reproducible chain-of-custody archive, a single
//! merged PDF with bit-for-bit pixel fidelity, and a metadata descriptor
//! binding both to a content digest — delivered transactionally to a
//! per-document remote directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DocumentId
//!  │
//!  ├─ 1. Fetch     archive bytes from the source REST collaborator
//!  ├─ 2. Extract   page images in archive entry order (tolerant pass)
//!  ├─ 3. Package   pages + manifest → reproducible chain.zip      ┐ run
//!  ├─ 4. Merge     pages → lossless paginated document.pdf        ┘ concurrently
//!  ├─ 5. Compose   {id, pageCount, sha256(chain.zip)} → meta.xml
//!  ├─ 6. Upload    all three objects to remoteRoot/DocumentId/
//!  └─ 7. Clean     scoped temp artifacts (guaranteed on every exit path)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docmigrate::{run_migration, HttpSource, LocalDirTarget, MigrationConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(HttpSource::new("http://localhost:8081", None, 120)?);
//!     let target = Arc::new(LocalDirTarget::new("/mnt/archive-target"));
//!     let config = MigrationConfig::builder().concurrency(5).build()?;
//!
//!     let run = run_migration(source, target, &config).await?;
//!     println!("{}/{} documents migrated", run.stats.succeeded, run.stats.total);
//!     for (id, failure) in run.failures() {
//!         eprintln!("{id}: {failure}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! | Property | How |
//! |----------|-----|
//! | Page order preserved end-to-end | archive entry order drives custody entries and PDF pages |
//! | Custody archive reproducible | fixed naming, fixed timestamps, stateless manifest rendering |
//! | Merge is lossless | raw pixels embedded with Flate, never JPEG recompression |
//! | Idempotent retry | re-running a document yields identical custody bytes and digest |
//! | Temp artifacts never leak | per-run `TempDir`, removed on success, failure, and cancellation |
//! | Failures isolated | one terminal result per document; siblings unaffected |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docmigrate` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docmigrate = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod migrate;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{MigrationConfig, MigrationConfigBuilder, DEFAULT_PAGE_EXTENSIONS};
pub use error::{MigrateError, MigrationFailure, Stage};
pub use migrate::{migrate_document, CHAIN_OBJECT, DOCUMENT_OBJECT, META_OBJECT};
pub use orchestrator::{migrate_documents, migrate_stream, run_migration, ResultStream};
pub use output::{DocumentId, MigrationReceipt, MigrationResult, MigrationRun, MigrationStats};
pub use progress::{MigrationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use remote::{LocalDirTarget, RemoteTarget};
pub use source::{DocumentSource, HttpSource};
