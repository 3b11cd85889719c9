//! Session tokens
//!
//! A [`SessionToken`] is the opaque credential handed to a client after a successful
//! login. It carries no data of its own; holding it is the proof of an authenticated
//! session. Tokens are owned by the session layer, not by the login guard.

use serde::{Deserialize, Serialize};

use crate::{Error, crypto};

/// Opaque session credential with 256 bits of entropy.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an existing token string, e.g. one read back from storage.
    pub fn new(token: &str) -> Self {
        SessionToken(token.to_string())
    }

    /// Create a new random token.
    pub fn new_random() -> Result<Self, Error> {
        Ok(SessionToken(crypto::generate_secure_token()?))
    }

    /// Compare against a presented token without short-circuiting.
    pub fn matches(&self, presented: &str) -> bool {
        crypto::constant_time_compare(self.0.as_bytes(), presented.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        SessionToken(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Keep tokens out of logs that use `{:?}`.
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}
