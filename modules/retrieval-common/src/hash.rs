/// Deterministic content hash (FNV-1a). Used to derive candidate/article
/// ids from canonical URLs — must be stable across process restarts, which
/// rules out `DefaultHasher` (randomized per-process to resist HashDoS).
pub fn content_hash(content: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325; // FNV offset basis
    for byte in content.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3); // FNV prime
    }
    hash
}

/// Hex-encoded id for a canonical URL, used as `Candidate::id` / `NormalizedArticle::id`.
pub fn id_for_url(canonical_url: &str) -> String {
    format!("{:016x}", content_hash(&canonical_url.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        assert_eq!(content_hash("https://a.example/x"), content_hash("https://a.example/x"));
    }

    #[test]
    fn differs_for_different_input() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn id_is_lowercase_hex() {
        let id = id_for_url("https://Example.com/Story");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
