//! Integrity hashing: SHA-256 over artifact bytes.
//!
//! The digest underlies the chain-of-custody claim in the metadata
//! descriptor and doubles as an idempotency key: because packaging is
//! deterministic, re-running the pipeline for the same input yields the same
//! digest, so a retried delivery can be recognized as equivalent.
//! Cryptographic strength is required — a CRC would detect corruption but
//! not tampering.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 of `bytes` as a 64-character lowercase hex string.
///
/// Pure function: deterministic, no side effects, no failure modes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
