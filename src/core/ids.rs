use sha2::{Digest, Sha256};


pub type ConceptId = u64;


/// Lowercases, trims and collapses inner whitespace. Returns `None` for names that end up empty.
pub fn normalize_concept_name(raw: &str) -> Option<String> {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}


/// First eight bytes of SHA-256 over the normalized name, big-endian.
pub fn concept_id(name: &str) -> ConceptId {
    let normalized = normalize_concept_name(name).unwrap_or_default();
    let digest = Sha256::digest(normalized.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
