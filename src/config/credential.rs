//! Credential value objects.
//!
//! Credentials are a closed set of variants; adding a new authentication
//! method means adding a variant here and handling it everywhere the
//! compiler points at.

use std::fmt;

/// Username and password authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredential {
    name: String,
    username: String,
    password: String,
}

impl PasswordCredential {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Private-key authentication with an optional key passphrase.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyCredential {
    name: String,
    username: String,
    key: String,
    passphrase: String,
}

impl KeyCredential {
    /// Create a key credential with an empty passphrase.
    pub fn new(name: impl Into<String>, username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            key: key.into(),
            passphrase: String::new(),
        }
    }

    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = passphrase.into();
        self
    }

    /// The private key text (PEM or OpenSSH format).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key passphrase; empty when the key is unencrypted.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

/// A named login usable against target hosts.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Password(PasswordCredential),
    Key(KeyCredential),
}

impl Credential {
    /// Unique name within a `Config`.
    pub fn name(&self) -> &str {
        match self {
            Self::Password(c) => &c.name,
            Self::Key(c) => &c.name,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Password(c) => &c.username,
            Self::Key(c) => &c.username,
        }
    }

    /// Short label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::Key(_) => "key",
        }
    }
}

impl From<PasswordCredential> for Credential {
    fn from(c: PasswordCredential) -> Self {
        Self::Password(c)
    }
}

impl From<KeyCredential> for Credential {
    fn from(c: KeyCredential) -> Self {
        Self::Key(c)
    }
}

// Secrets never reach logs through `{:?}`.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("username", &self.username())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("name", &self.name)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for KeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCredential")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("encrypted", &!self.passphrase.is_empty())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let pw: Credential = PasswordCredential::new("bobslogin", "bob", "sekurity").into();
        assert_eq!(pw.name(), "bobslogin");
        assert_eq!(pw.username(), "bob");
        assert_eq!(pw.kind(), "password");

        let key: Credential = KeyCredential::new("bobskey", "bob", "KEYDATA").into();
        assert_eq!(key.kind(), "key");
        match key {
            Credential::Key(k) => assert_eq!(k.passphrase(), ""),
            Credential::Password(_) => panic!("expected key credential"),
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let pw: Credential = PasswordCredential::new("a", "bob", "hunter2").into();
        let key: Credential = KeyCredential::new("b", "bob", "-----BEGIN KEY-----")
            .with_passphrase("topsecret")
            .into();

        let rendered = format!("{:?} {:?}", pw, key);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("BEGIN KEY"));
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("bob"));
    }
}
