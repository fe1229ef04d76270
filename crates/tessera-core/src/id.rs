//! Stable node identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A 128-bit identifier that persists across save/load cycles.
///
/// `SceneId::NULL` is reserved: it means "no parent" for persisted parent
/// references and "unset" everywhere else.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(Uuid);

impl SceneId {
    pub const NULL: Self = Self(Uuid::nil());

    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Build an identifier from a raw value (for fixtures and tests)
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneId({})", self.0.hyphenated())
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SceneId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = SceneId::new();
        let id2 = SceneId::new();
        assert_ne!(id1, id2);
        assert!(!id1.is_null());
    }

    #[test]
    fn test_null_sentinel() {
        assert!(SceneId::NULL.is_null());
        assert_eq!(SceneId::default(), SceneId::NULL);
        assert!(SceneId::from_u128(0).is_null());
        assert!(!SceneId::from_u128(7).is_null());
    }

    #[test]
    fn test_parse_display() {
        let id = SceneId::from_u128(0x1234);
        let text = id.to_string();
        assert_eq!(text, "00000000-0000-0000-0000-000000001234");
        let parsed: SceneId = text.parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-an-id".parse::<SceneId>().is_err());
    }

    #[test]
    fn test_serializes_as_opaque_token() {
        let id = SceneId::from_u128(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-00000000002a\"");
    }
}
