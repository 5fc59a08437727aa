//! Metadata composition: bind document identity, page count, and custody
//! digest into the `meta.xml` descriptor.
//!
//! Composition is pure and always succeeds for well-formed inputs. The
//! digest passed in must be computed over the *finalized* custody archive
//! bytes — the delivery coordinator enforces that ordering; composing from a
//! not-yet-durable archive would publish a hash nothing can verify.

use crate::output::DocumentId;
use crate::pipeline::digest::sha256_hex;
use serde::{Deserialize, Serialize};

/// The structured descriptor delivered as `meta.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub doc_id: DocumentId,
    pub page_count: usize,
    /// SHA-256 of the custody archive, lowercase hex.
    pub custody_digest: String,
}

/// Compose the metadata descriptor. Pure.
pub fn compose(doc_id: &DocumentId, page_count: usize, custody_digest: &str) -> Metadata {
    Metadata {
        doc_id: doc_id.clone(),
        page_count,
        custody_digest: custody_digest.to_string(),
    }
}

/// Convenience: compose directly from finalized custody archive bytes.
pub fn compose_from_custody(doc_id: &DocumentId, page_count: usize, custody: &[u8]) -> Metadata {
    compose(doc_id, page_count, &sha256_hex(custody))
}

impl Metadata {
    /// Render the descriptor as the `meta.xml` document.
    pub fn to_xml(&self) -> String {
        format!(
            "<Document>\n  <id>{}</id>\n  <pages>{}</pages>\n  <chainHash>{}</chainHash>\n</Document>\n",
            xml_escape(self.doc_id.as_str()),
            self.page_count,
            self.custody_digest,
        )
    }
}

/// Escape the five XML-significant characters.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
