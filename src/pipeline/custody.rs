//! Chain-of-custody packaging: repackage pages plus a manifest into a
//! reproducible ZIP.
//!
//! ## Why deterministic?
//!
//! The custody archive's SHA-256 is published in the metadata descriptor and
//! is the artifact auditors verify. Re-running a failed migration must
//! produce byte-identical custody bytes so the republished digest matches —
//! therefore entry order, entry names, timestamps, and manifest rendering
//! are all fixed. The entry timestamp is pinned to the ZIP epoch: the
//! provenance date lives in the source system, not in this container.
//!
//! Layout: `page-001.<ext> … page-NNN.<ext>` in extraction order, then
//! `manifest.json` recording `{docId, pageCount}`. Entry count is always
//! `pageCount + 1`.

use crate::error::MigrateError;
use crate::output::DocumentId;
use crate::pipeline::extract::PageImage;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::{FileOptions, ZipWriter};

/// Name of the manifest entry, always last in the archive.
pub const MANIFEST_NAME: &str = "manifest.json";

/// The manifest entry recorded after the pages.
///
/// A plain serde struct so serialization is a stateless call with no
/// per-invocation encoder state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "docId")]
    pub doc_id: String,
    #[serde(rename = "pageCount")]
    pub page_count: usize,
}

impl Manifest {
    /// Render the manifest as canonical JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MigrateError> {
        serde_json::to_vec(self).map_err(MigrateError::packaging)
    }
}

/// Build the chain-of-custody archive for `doc_id` over `pages`.
///
/// Pages are written in input order under the deterministic naming scheme
/// `page-%03d.<ext>`, where `<ext>` is each page's original suffix
/// lowercased. Identical `(doc_id, pages)` input produces byte-identical
/// output on every invocation.
///
/// # Errors
/// [`MigrateError::Packaging`] on any underlying write failure. Packaging
/// failures are not retried here; they surface as a stage failure to the
/// delivery coordinator.
pub fn pack(doc_id: &DocumentId, pages: &[PageImage]) -> Result<Vec<u8>, MigrateError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        // Fixed timestamp keeps the archive reproducible.
        let options: FileOptions<()> =
            FileOptions::default().last_modified_time(zip::DateTime::default());

        for (i, page) in pages.iter().enumerate() {
            let entry_name = page_entry_name(i + 1, &page.extension());
            zip.start_file(&entry_name, options)
                .map_err(MigrateError::packaging)?;
            zip.write_all(&page.bytes).map_err(MigrateError::packaging)?;
        }

        let manifest = Manifest {
            doc_id: doc_id.to_string(),
            page_count: pages.len(),
        };
        zip.start_file(MANIFEST_NAME, options)
            .map_err(MigrateError::packaging)?;
        zip.write_all(&manifest.to_bytes()?)
            .map_err(MigrateError::packaging)?;

        zip.finish().map_err(MigrateError::packaging)?;
    }

    let bytes = buf.into_inner();
    debug!(
        "Packed custody archive for '{}': {} pages, {} bytes",
        doc_id,
        pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Deterministic entry name for the 1-based page `number`.
fn page_entry_name(number: usize, ext: &str) -> String {
    format!("page-{number:03}.{ext}")
}
