//! Actor identity shared by both game modes.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Unique actor identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct ActorId(pub [u8; 16]);

impl ActorId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random identifier, one per connection.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

/// Public profile supplied by the identity service at join time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    /// Display name.
    pub username: String,
    /// Progression level at join time.
    pub level: u32,
}

impl ActorProfile {
    /// Create a profile.
    pub fn new(username: impl Into<String>, level: u32) -> Self {
        Self {
            username: username.into(),
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_ordering() {
        let id1 = ActorId::new([0; 16]);
        let id2 = ActorId::new([1; 16]);
        let id3 = ActorId::new([0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(id1 < id2);
        assert!(id1 < id3);
        assert!(id3 < id2);
    }

    #[test]
    fn test_uuid_roundtrip() {
        let id = ActorId::random();
        let parsed = ActorId::from_uuid_str(&id.to_uuid_string());
        assert_eq!(parsed, Some(id));
        assert_eq!(ActorId::from_uuid_str("not-a-uuid"), None);
    }

    #[test]
    fn test_short_form() {
        let id = ActorId::new([0xab; 16]);
        assert_eq!(id.short(), "abababab");
    }
}
