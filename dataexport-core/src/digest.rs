//! Deterministic one-way digest used to pseudonymize redacted values.
//!
//! The digest is SHA-256 over the value followed by the shared secret, with
//! no separator. It is unsalted beyond that secret: equal inputs always give
//! equal tokens, so joins across exported files keep working, but short or
//! guessable values can be recovered by dictionary attack.

use base64::Engine;
use sha2::{Digest, Sha256};

/// Encoding applied to the 32-byte hash.
///
/// One scheme is chosen per export run and used for every redacted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestScheme {
    /// 64 lowercase hex characters
    #[default]
    Sha256Hex,
    /// Standard base64 with padding, as written by earlier exports
    Sha256Base64,
}

impl DigestScheme {
    /// Hashes `text` followed by `secret` and encodes the result.
    pub fn apply(self, text: &str, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(secret.as_bytes());
        let hash = hasher.finalize();

        match self {
            Self::Sha256Hex => hex::encode(hash),
            Self::Sha256Base64 => base64::engine::general_purpose::STANDARD.encode(hash),
        }
    }
}

impl std::fmt::Display for DigestScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256Hex => write!(f, "sha256-hex"),
            Self::Sha256Base64 => write!(f, "sha256-base64"),
        }
    }
}

/// Canonical digest: lowercase hex SHA-256 of `text` followed by `secret`.
///
/// # Example
/// ```rust
/// use dataexport_core::digest::digest;
///
/// let token = digest("this is a test", "");
/// assert_eq!(
///     token,
///     "2e99758548972a8e8822ad47fa1017ff72f06f3ff6a016851f45c398732bc50c"
/// );
/// ```
pub fn digest(text: &str, secret: &str) -> String {
    DigestScheme::Sha256Hex.apply(text, secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_no_secret() {
        assert_eq!(
            digest("this is a test", ""),
            "2e99758548972a8e8822ad47fa1017ff72f06f3ff6a016851f45c398732bc50c"
        );
    }

    #[test]
    fn test_digest_with_secret() {
        assert_eq!(
            digest("this is a test", "test_secret"),
            "e1ef5ca0f4c48a7a02e664b3686427a14c6dd730dc80819d9edb3242ea49fd28"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        for (text, secret) in [("", ""), ("a@x.com", "pepper"), ("O'Brien", "s")] {
            assert_eq!(digest(text, secret), digest(text, secret));
        }
    }

    #[test]
    fn test_digest_depends_on_secret() {
        assert_ne!(digest("a@x.com", ""), digest("a@x.com", "pepper"));
        assert_ne!(digest("a@x.com", "pepper"), digest("a@x.com", "salt"));
    }

    #[test]
    fn test_digest_is_plain_concatenation() {
        // No separator between text and secret
        assert_eq!(digest("ab", "c"), digest("a", "bc"));
    }

    #[test]
    fn test_digest_shape() {
        let token = digest("anything", "secret");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_base64_scheme_encodes_same_hash() {
        use base64::Engine;

        let hex_token = DigestScheme::Sha256Hex.apply("this is a test", "");
        let b64_token = DigestScheme::Sha256Base64.apply("this is a test", "");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&b64_token)
            .unwrap();

        assert_eq!(b64_token.len(), 44);
        assert_eq!(hex::encode(decoded), hex_token);
    }
}
