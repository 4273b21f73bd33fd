//! Checksum digests for artifact integrity.
//!
//! Digest strings carry a scheme prefix: `blake3:<hex>` (preferred) or
//! `sha1:<hex>` (legacy). Verification dispatches on the prefix.

use sha1::{Digest, Sha1};

use crate::error::{GarnerError, GarnerResult};

/// Compute a prefixed Blake3 digest of data
pub fn blake3_digest(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data).to_hex())
}

/// Compute a prefixed SHA-1 digest of data
pub fn sha1_digest(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("sha1:{}", hex::encode(hasher.finalize()))
}

/// Verify data against an expected prefixed digest. `subject` names the
/// artifact for the error message.
pub fn verify_checksum(subject: &str, data: &[u8], expected: &str) -> GarnerResult<()> {
    let actual = if expected.starts_with("blake3:") {
        blake3_digest(data)
    } else if expected.starts_with("sha1:") {
        sha1_digest(data)
    } else {
        return Err(GarnerError::ConfigValidation {
            field: "checksum".to_string(),
            reason: format!("unknown digest scheme in '{}'", expected),
        });
    };

    if actual == expected {
        Ok(())
    } else {
        Err(GarnerError::ChecksumMismatch {
            subject: subject.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
