// crates/fleetgate-core/src/core/hashing.rs
// ============================================================================
// Module: Fleetgate Canonical Hashing
// Description: RFC 8785 JSON canonicalization and plan digests.
// Purpose: Guarantee that identical requests rehash to identical plan hashes.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Plan hashes are SHA-256 digests over RFC 8785 (JCS) canonical JSON: object
//! keys are sorted recursively, array order is preserved, and scalars encode
//! as in standard JSON. Clients may reorder keys inside `params` freely and
//! still obtain the same `plan_hash` on replay.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum canonical JSON size accepted for hashing, in bytes.
///
/// Plan seeds are bounded request summaries; anything larger indicates a
/// hostile or broken client.
pub const MAX_CANONICAL_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical digests.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
    /// Canonical JSON exceeds [`MAX_CANONICAL_BYTES`].
    #[error("canonical json exceeds size limit ({actual} > {limit})")]
    SizeLimitExceeded {
        /// Maximum allowed bytes.
        limit: usize,
        /// Observed size in bytes.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails and
/// [`HashError::SizeLimitExceeded`] when the encoding exceeds the size limit.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    let bytes =
        serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))?;
    if bytes.len() > MAX_CANONICAL_BYTES {
        return Err(HashError::SizeLimitExceeded {
            limit: MAX_CANONICAL_BYTES,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Computes the lowercase-hex SHA-256 digest of a value's canonical JSON.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails or exceeds limits.
pub fn plan_digest<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// Computes the lowercase-hex SHA-256 digest of raw bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}
