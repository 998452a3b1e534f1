//! Token sanitizing for logs and debug output.
//!
//! Recognized token formats keep their readable prefix and have the
//! signature part masked; anything else is truncated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Replacement for hidden token content.
pub const MASK: &str = "**";

/// Replacement for a value that must not be shown at all.
pub const HIDDEN: &str = "**HIDDEN**";

/// Longest payload shown before truncation.
pub const MAX_VISIBLE_PAYLOAD_LENGTH: usize = 15;

/// Shape of one token format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenVersion {
    pub prefix: &'static str,
    pub delimiter: char,
    /// Index of the part to mask after splitting on `delimiter`.
    pub signature_position: Option<usize>,
    /// Minimal number of parts for the token to be well-formed.
    pub parts: usize,
}

pub const V0: TokenVersion = TokenVersion {
    prefix: "v0.",
    delimiter: '.',
    signature_position: None,
    parts: 1,
};

pub const NE1: TokenVersion = TokenVersion {
    prefix: "ne1",
    delimiter: '.',
    signature_position: Some(1),
    parts: 2,
};

pub const DE1: TokenVersion = TokenVersion {
    prefix: "nd1",
    delimiter: '.',
    signature_position: Some(1),
    parts: 2,
};

pub const JWT: TokenVersion = TokenVersion {
    prefix: "eyJ",
    delimiter: '.',
    signature_position: Some(2),
    parts: 3,
};

const ACCESS_TOKEN_VERSIONS: &[TokenVersion] = &[V0, NE1];
const CREDENTIAL_VERSIONS: &[TokenVersion] = &[V0, NE1, DE1, JWT];

/// Masks tokens of a fixed set of formats.
#[derive(Debug, Clone, Copy)]
pub struct TokenSanitizer {
    versions: &'static [TokenVersion],
}

impl TokenSanitizer {
    pub fn new(versions: &'static [TokenVersion]) -> Self {
        Self { versions }
    }

    /// Sanitizer for IAM access tokens.
    pub fn access_tokens() -> Self {
        Self::new(ACCESS_TOKEN_VERSIONS)
    }

    /// Sanitizer for any credential a record may carry.
    pub fn credentials() -> Self {
        Self::new(CREDENTIAL_VERSIONS)
    }

    fn version_of(&self, token: &str) -> Option<&'static TokenVersion> {
        self.versions.iter().find(|v| token.starts_with(v.prefix))
    }

    /// Masked form of `token`, safe to print.
    pub fn sanitize(&self, token: &str) -> String {
        if token.is_empty() {
            return String::new();
        }
        let Some(version) = self.version_of(token) else {
            return sanitize_unrecognized(token);
        };
        let Some(signature) = version.signature_position else {
            return sanitize_without_signature(token, version.prefix);
        };

        let mut parts: Vec<&str> = token.split(version.delimiter).collect();
        if parts.len() <= signature {
            return sanitize_unrecognized(token);
        }
        parts[signature] = MASK;
        parts.join(&version.delimiter.to_string())
    }

    /// True if `token` has a known prefix and enough parts.
    pub fn is_supported(&self, token: &str) -> bool {
        self.version_of(token)
            .map(|v| token.split(v.delimiter).count() >= v.parts)
            .unwrap_or(false)
    }
}

fn truncated(text: &str) -> String {
    text.chars().take(MAX_VISIBLE_PAYLOAD_LENGTH).collect()
}

fn sanitize_unrecognized(token: &str) -> String {
    format!("{}{}", truncated(token), MASK)
}

fn sanitize_without_signature(token: &str, prefix: &str) -> String {
    let payload = &token[prefix.len()..];
    if payload.chars().count() <= MAX_VISIBLE_PAYLOAD_LENGTH {
        return token.to_string();
    }
    format!("{}{}{}", prefix, truncated(payload), MASK)
}

/// Secret string carried by a record.
///
/// Serializes as the plain string. `Debug` and `Display` print the
/// sanitized form for recognized tokens and [`HIDDEN`] otherwise.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sanitized(&self) -> String {
        let sanitizer = TokenSanitizer::credentials();
        if sanitizer.is_supported(&self.0) {
            sanitizer.sanitize(&self.0)
        } else {
            HIDDEN.to_string()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.sanitized())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sanitized())
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ne1payload.signature", "ne1payload.**")]
    #[case("ne1payload.signature.extra", "ne1payload.**.extra")]
    #[case("v0.short", "v0.short")]
    #[case("v0.0123456789abcdefXYZ", "v0.0123456789abcde**")]
    #[case("short", "short**")]
    #[case("0123456789abcdefXYZ", "0123456789abcde**")]
    #[case("ne1nosignature", "ne1nosignature**")]
    #[case("", "")]
    fn test_access_token_sanitize(#[case] token: &str, #[case] expected: &str) {
        assert_eq!(TokenSanitizer::access_tokens().sanitize(token), expected);
    }

    #[test]
    fn test_jwt_masks_signature() {
        let s = TokenSanitizer::credentials();
        assert_eq!(s.sanitize("eyJhbGci.eyJzdWIi.c2lnbmF0dXJl"), "eyJhbGci.eyJzdWIi.**");
        assert_eq!(s.sanitize("nd1abc.def"), "nd1abc.**");
    }

    #[test]
    fn test_access_sanitizer_ignores_jwt_format() {
        let s = TokenSanitizer::access_tokens();
        assert!(!s.is_supported("eyJhbGci.eyJzdWIi.c2lnbmF0dXJl"));
        assert_eq!(s.sanitize("eyJhbGci.eyJzdWIi.c2lnbmF0dXJl"), "eyJhbGci.eyJzdW**");
    }

    #[test]
    fn test_is_supported_requires_parts() {
        let s = TokenSanitizer::credentials();
        assert!(s.is_supported("ne1abc.sig"));
        assert!(!s.is_supported("ne1abc"));
        assert!(s.is_supported("v0.anything"));
        assert!(!s.is_supported("eyJonly.two"));
        assert!(!s.is_supported("hunter2"));
    }

    #[test]
    fn test_credential_debug_never_prints_secret() {
        let password = Credential::new("hunter2");
        assert_eq!(format!("{:?}", password), "Credential(**HIDDEN**)");
        assert_eq!(password.to_string(), HIDDEN);

        let token = Credential::new("ne1payload.secretsignature");
        assert_eq!(format!("{}", token), "ne1payload.**");
        assert!(!format!("{:?}", token).contains("secretsignature"));
    }

    #[test]
    fn test_credential_serializes_plain() {
        let c = Credential::new("hunter2");
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"hunter2\"");
        let back: Credential = serde_json::from_str("\"hunter2\"").unwrap();
        assert_eq!(back.expose(), "hunter2");
    }
}
