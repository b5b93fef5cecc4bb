//! Secure credential container with automatic memory zeroing.
//!
//! # Security
//! - Username and password are stored in `Zeroizing<T>` containers
//! - Memory is cleared when the credentials go out of scope
//! - The password never appears in `Debug` output

use zeroize::{Zeroize, Zeroizing};

/// SQL Server login credentials that zero their memory on drop.
///
/// # Example
///
/// ```rust
/// use dataexport_core::security::Credentials;
///
/// let creds = Credentials::new("sa".to_string(), Some("secret".to_string()));
/// assert_eq!(creds.username(), "sa");
/// assert!(creds.has_password());
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<Option<String>>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: String, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
        }
    }

    /// Credentials for integrated (operating system) authentication.
    pub fn integrated() -> Self {
        Self::new(String::new(), None)
    }

    /// Gets the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Gets the password, if one was provided.
    ///
    /// Only the driver configuration should call this.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Checks if a password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username())
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("testuser".to_string(), Some("testpass".to_string()));
        assert_eq!(creds.username(), "testuser");
        assert_eq!(creds.password(), Some("testpass"));
        assert!(creds.has_password());
    }

    #[test]
    fn test_credentials_no_password() {
        let creds = Credentials::new("testuser".to_string(), None);
        assert!(!creds.has_password());
        assert_eq!(creds.password(), None);
    }

    #[test]
    fn test_integrated_credentials_are_empty() {
        let creds = Credentials::integrated();
        assert_eq!(creds.username(), "");
        assert!(!creds.has_password());
    }

    #[test]
    fn test_debug_masks_password() {
        let creds = Credentials::new("admin".to_string(), Some("hunter2".to_string()));
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(debug.contains("****"));
        assert!(!debug.contains("hunter2"));
    }
}
