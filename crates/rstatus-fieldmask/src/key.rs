//! Single field key.

use std::borrow::Borrow;
use std::fmt;

use crate::Error;

/// One component of a field path.
///
/// Keys made only of ASCII letters, digits and `_` marshal as-is; anything
/// else (map keys such as label names, mostly) is written as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the key can be written without quoting.
    pub fn is_simple(key: &str) -> bool {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Serialize the key, quoting it when needed.
    pub fn marshal(&self) -> String {
        if Self::is_simple(&self.0) {
            self.0.clone()
        } else {
            serde_json::Value::String(self.0.clone()).to_string()
        }
    }

    /// Parse a key from its marshalled form.
    pub fn unmarshal(marshalled: &str) -> Result<Self, Error> {
        if marshalled.starts_with('"') {
            return serde_json::from_str::<String>(marshalled)
                .map(Self)
                .map_err(|e| Error::MalformedKey(format!("{}: {}", marshalled, e)));
        }
        if Self::is_simple(marshalled) {
            return Ok(Self(marshalled.to_string()));
        }
        Err(Error::MalformedKey(marshalled.to_string()))
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_key_is_not_quoted() {
        assert_eq!(FieldKey::new("max_size_bytes").marshal(), "max_size_bytes");
    }

    #[test]
    fn test_special_key_is_quoted() {
        assert_eq!(FieldKey::new("team/owner").marshal(), "\"team/owner\"");
        assert_eq!(FieldKey::new("").marshal(), "\"\"");
    }

    #[test]
    fn test_unmarshal_quoted() {
        let key = FieldKey::unmarshal("\"a.b\"").unwrap();
        assert_eq!(key.as_str(), "a.b");
    }

    #[test]
    fn test_unmarshal_rejects_bare_special_chars() {
        assert!(FieldKey::unmarshal("a.b").is_err());
        assert!(FieldKey::unmarshal("\"unterminated").is_err());
    }

    #[test]
    fn test_quoted_round_trip_with_escapes() {
        let key = FieldKey::new("quote\"inside");
        assert_eq!(FieldKey::unmarshal(&key.marshal()).unwrap(), key);
    }
}
