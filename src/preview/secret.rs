use sha2::{Digest, Sha256};

/// Compare a presented preview secret against the configured one.
///
/// Both values are hashed first so the comparison runs over fixed-length
/// digests, and the bytes are folded without an early exit.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
