//! Pipeline stages for one document migration.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different container format) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! archive bytes ──▶ extract ──▶ custody ──▶ digest ──▶ compose
//!   (ZIP)           (pages) │   (chain.zip)  (sha256)   (meta.xml)
//!                           └─▶ merge
//!                               (document.pdf)
//! ```
//!
//! 1. [`extract`] — parse the inbound ZIP and collect page images in entry
//!    order
//! 2. [`custody`] — repackage pages plus a manifest into the reproducible
//!    chain-of-custody archive
//! 3. [`merge`]   — lossless-merge the pages into one paginated PDF; runs
//!    independently of `custody` over the same immutable page slice
//! 4. [`digest`]  — SHA-256 over the finalized custody bytes
//! 5. [`compose`] — bind document id, page count, and custody digest into
//!    the metadata descriptor

pub mod compose;
pub mod custody;
pub mod digest;
pub mod extract;
pub mod merge;
