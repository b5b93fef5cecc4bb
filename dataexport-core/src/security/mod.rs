//! Security utilities for credential and secret handling.
//!
//! - `credentials`: login container with automatic memory zeroing
//! - [`Secret`]: the shared digest secret, zeroed on drop

mod credentials;

pub use credentials::Credentials;

use zeroize::Zeroizing;

/// Shared secret appended to every value before hashing.
///
/// The secret is never printed; `Debug` only reports whether it is set.
#[derive(Clone, Default)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wraps a secret value.
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// The secret text, for hashing only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when no secret was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(****)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_masked() {
        let secret = Secret::new("pepper".to_string());
        assert_eq!(secret.expose(), "pepper");
        assert_eq!(format!("{:?}", secret), "Secret(****)");
        assert_eq!(format!("{:?}", Secret::default()), "Secret(<empty>)");
        assert!(Secret::default().is_empty());
    }
}
