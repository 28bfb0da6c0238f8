//! Record identifiers and content hashes.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of `text`; identifies chunks for deduplication.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fresh store record id: `{unix_millis}_{20 hex chars}`.
pub fn new_record_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", millis, &random[..20])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let hash = content_hash("Hello, world!");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash("Hello, world!"));
        assert_ne!(hash, content_hash("Different text"));
    }

    #[test]
    fn test_record_id_shape() {
        let id = new_record_id();
        let (millis, random) = id.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(random.len(), 20);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_record_id());
    }
}
