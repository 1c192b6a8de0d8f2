use sha2::{Digest, Sha256};

/// SHA-256 over the sorted keys, as lowercase hex.
pub fn fingerprint_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> String {
    let mut keys: Vec<&str> = keys.into_iter().collect();
    keys.sort_unstable();

    let mut hasher = Sha256::new();
    for key in keys {
        hasher.update(key.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
