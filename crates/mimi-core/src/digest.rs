//! Content digests for payloads sent to the service

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of an uploaded payload, recorded alongside job history
/// so a job can be matched to the image it was started from.
#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// `sha256:<hex>` form used in job records
    pub fn to_prefixed_hex(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prefixed_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let digest = ContentDigest::of(b"abc");
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(digest.to_prefixed_hex().starts_with("sha256:ba7816bf"));
    }

    #[test]
    fn test_different_payloads_differ() {
        assert_ne!(ContentDigest::of(b"one"), ContentDigest::of(b"two"));
    }
}
