//! Shared SHA-256 hex digest utility.
//!
//! Used for the session-cache key digest, so the same (sources, file)
//! selection always resolves to the same cached consensus pass.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
