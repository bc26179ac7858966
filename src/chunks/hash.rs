//! Content hashes for cache-busting chunk payload URLs.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use sha2::{
    Digest,
    Sha256,
};

/// Hex characters kept from the SHA-256 digest.
pub const HASH_LEN: usize = 8;

/// Hashes the translations of `keys` that exist in `translations`.
///
/// Keys are serialized in sorted order, so the result does not depend on
/// insertion order. Keys without a translation are left out.
#[must_use]
pub fn chunk_hash<S>(translations: &HashMap<String, String, S>, keys: &BTreeSet<String>) -> String
where
    S: std::hash::BuildHasher,
{
    let subset: BTreeMap<&str, &str> = keys
        .iter()
        .filter_map(|key| translations.get(key).map(|value| (key.as_str(), value.as_str())))
        .collect();
    let serialized = serde_json::to_string(&subset).unwrap_or_default();
    let digest = Sha256::digest(serialized.as_bytes());
    let mut hex = hex_encode(&digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Lowercase hex of `bytes`.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
