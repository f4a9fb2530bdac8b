//! Server-issued job identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque job identifier issued by the generation service.
///
/// Once obtained (from a submission response or supplied by the user) the id
/// is authoritative; nothing read from the progress stream replaces it.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap an id exactly as issued. Returns `None` for empty or
    /// whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(raw))
    }

    /// Parse an id typed by a user; surrounding whitespace is dropped
    pub fn from_user_input(raw: &str) -> Option<Self> {
        Self::new(raw.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A file-name-safe form of the id, used for local job records
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ids_are_rejected() {
        assert!(JobId::new("").is_none());
        assert!(JobId::new("   ").is_none());
    }

    #[test]
    fn test_issued_id_is_kept_verbatim() {
        let id = JobId::new(" abc123 ").unwrap();
        assert_eq!(id.as_str(), " abc123 ");
    }

    #[test]
    fn test_user_input_is_trimmed() {
        let id = JobId::from_user_input("  abc123\n").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.to_string(), "abc123");
        assert!(JobId::from_user_input(" \t").is_none());
    }

    #[test]
    fn test_file_stem_replaces_unsafe_characters() {
        let id = JobId::new("job/../42:x").unwrap();
        assert_eq!(id.file_stem(), "job_.._42_x");
    }

    #[test]
    fn test_serde_transparent() {
        let id = JobId::new("abc123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
