//! Archive ingestion: parse the inbound ZIP and collect page images.
//!
//! ## Why a tolerant pass?
//!
//! Source archives are produced by a decade of scanner firmware and export
//! tools: they contain thumbnails, OCR sidecars, directory stubs, and OS
//! metadata next to the actual page scans. Extraction keeps only entries
//! whose suffix is a recognized raster format and silently skips the rest —
//! a strict-schema pass would reject most of the real inventory.
//!
//! Page order equals the container's entry enumeration order. Callers must
//! not assume alphabetical or numeric naming beyond what the source archive
//! encodes; the scanner wrote entries in scan order and that order is the
//! page order.

use crate::error::MigrateError;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Largest accepted uncompressed page payload.
///
/// The archive's declared entry size is untrusted input; it is checked
/// against this limit before any buffer is reserved. Real scan pages are
/// megabytes, so the limit only trips on corrupt or hostile archives —
/// and skipping such an entry would silently change the page count, so it
/// is rejected instead.
const MAX_PAGE_BYTES: u64 = 256 * 1024 * 1024;

/// One extracted raster page: the original entry name plus the raw
/// pixel-encoded payload.
///
/// The payload is treated as opaque bytes until the merge stage decodes it;
/// geometry is derived on demand via [`PageImage::dimensions`].
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Entry name inside the source archive.
    pub name: String,
    /// Raw image bytes, exactly as stored in the archive.
    pub bytes: Vec<u8>,
}

impl PageImage {
    /// Lowercased file suffix of the entry name, without the dot.
    pub fn extension(&self) -> String {
        self.name
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    /// Derive (width, height) in pixels by decoding the payload.
    pub fn dimensions(&self) -> Result<(u32, u32), image::ImageError> {
        let img = image::load_from_memory(&self.bytes)?;
        Ok((img.width(), img.height()))
    }
}

/// Extract all recognized page images from an inbound archive.
///
/// # Arguments
/// * `archive`    — raw bytes of the source ZIP
/// * `extensions` — recognized suffixes, lowercase, without the dot
///
/// # Errors
/// * [`MigrateError::InvalidArchive`] — the bytes are not a parsable ZIP,
///   or a page entry declares an uncompressed size over [`MAX_PAGE_BYTES`]
/// * [`MigrateError::NoPagesFound`]   — zero entries match a recognized suffix
///
/// Directories and non-matching entries are skipped without error.
pub fn extract_pages(archive: &[u8], extensions: &[String]) -> Result<Vec<PageImage>, MigrateError> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(|e| MigrateError::InvalidArchive {
        detail: e.to_string(),
    })?;

    let mut pages = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| MigrateError::InvalidArchive {
            detail: format!("entry {i}: {e}"),
        })?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if !has_recognized_suffix(&name, extensions) {
            debug!("Skipping non-page entry '{name}'");
            continue;
        }

        let declared = entry.size();
        if declared > MAX_PAGE_BYTES {
            return Err(MigrateError::InvalidArchive {
                detail: format!(
                    "entry '{name}' declares {declared} bytes (limit {MAX_PAGE_BYTES})"
                ),
            });
        }

        let mut bytes = Vec::with_capacity(declared as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| MigrateError::InvalidArchive {
                detail: format!("entry '{name}': {e}"),
            })?;

        debug!("Extracted page '{}' ({} bytes)", name, bytes.len());
        pages.push(PageImage { name, bytes });
    }

    if pages.is_empty() {
        return Err(MigrateError::NoPagesFound {
            suffixes: extensions.join(", "),
        });
    }

    Ok(pages)
}

/// Case-insensitive suffix match against the recognized extension set.
fn has_recognized_suffix(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
