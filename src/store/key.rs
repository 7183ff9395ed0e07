//! # Entity Keys
//!
//! Store-assigned identifiers. A key is the entity kind plus either a
//! numeric id (allocated by the store) or a caller-chosen name, and
//! travels over the wire in an opaque URL-safe encoding.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use super::errors::{StoreError, StoreResult};

/// Kind/id separator inside the encoded form
const SEPARATOR: char = '\u{0}';

/// Identifier half of a key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyId {
    /// Numeric id allocated by the store
    Id(i64),
    /// Caller-chosen key name
    Name(String),
}

/// A globally unique entity key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    kind: String,
    id: KeyId,
}

impl Key {
    /// Key with a store-allocated numeric id
    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: KeyId::Id(id),
        }
    }

    /// Key with a caller-chosen name
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: KeyId::Name(name.into()),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    /// Encode as an opaque URL-safe string
    pub fn encode(&self) -> String {
        let raw = match &self.id {
            KeyId::Id(id) => format!("{}{}i{}", self.kind, SEPARATOR, id),
            KeyId::Name(name) => format!("{}{}n{}", self.kind, SEPARATOR, name),
        };
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    /// Decode a string produced by [`Key::encode`]
    pub fn decode(encoded: &str) -> StoreResult<Self> {
        let invalid = || StoreError::InvalidKey(encoded.to_string());

        let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (kind, rest) = raw.split_once(SEPARATOR).ok_or_else(invalid)?;
        if kind.is_empty() {
            return Err(invalid());
        }

        let id = match rest.split_at_checked(1) {
            Some(("i", digits)) => KeyId::Id(digits.parse().map_err(|_| invalid())?),
            Some(("n", name)) if !name.is_empty() => KeyId::Name(name.to_string()),
            _ => return Err(invalid()),
        };

        Ok(Self {
            kind: kind.to_string(),
            id,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
