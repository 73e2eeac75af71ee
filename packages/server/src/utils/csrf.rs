use sha2::{Digest, Sha256};

/// Form field carrying the token on multipart and urlencoded submissions.
pub const FORM_FIELD: &str = "csrf_token";
/// Header alternative for script clients.
pub const HEADER: &str = "x-csrf-token";

/// Token bound to one login session: `hex(sha256(secret ":" sid))`.
pub fn token_for(secret: &str, sid: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(sid.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of an expected token and a presented one.
pub fn matches(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.trim().as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
