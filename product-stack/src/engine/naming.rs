//! Deterministic physical names derived from stack and logical id.

use sha2::{Digest, Sha256};

fn digest(stack_name: &str, logical_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stack_name.as_bytes());
    hasher.update(b"/");
    hasher.update(logical_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// `{stack}-{logicalId}{HASH}`, truncated to `max_len`.
pub(crate) fn physical_name(stack_name: &str, logical_id: &str, max_len: usize) -> String {
    let suffix = digest(stack_name, logical_id)[..12].to_uppercase();
    let stem: String = format!("{stack_name}-{logical_id}")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let keep = max_len.saturating_sub(suffix.len()).min(stem.len());

    format!("{}{suffix}", &stem[..keep])
}

/// Lowercase hex token of `len` characters (at most 64).
pub(crate) fn token(stack_name: &str, logical_id: &str, len: usize) -> String {
    let hash = digest(stack_name, logical_id);
    hash[..len.min(hash.len())].to_string()
}
