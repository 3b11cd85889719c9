//! Credential verification
//!
//! The login guard never looks at credentials itself. It asks a [`CredentialVerifier`]
//! whether an identifier/secret pair is acceptable and only acts on the answer, so the
//! account store can be swapped without touching the lockout policy.

use async_trait::async_trait;
use password_auth::VerifyError;

use crate::{crypto::constant_time_compare, error::ValidationError};

/// Decides whether a credential pair is valid.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Return `true` when `secret` is the correct secret for `identifier`.
    ///
    /// Implementations must not distinguish unknown identifiers from wrong secrets.
    async fn verify(&self, identifier: &str, secret: &str) -> bool;
}

/// A single administrator account.
///
/// Holds the admin email and an Argon2 PHC hash of the password; the plaintext
/// password is never kept. Emails are compared case-insensitively.
#[derive(Clone)]
pub struct AdminCredentials {
    email: String,
    password_hash: String,
}

impl AdminCredentials {
    /// Create from an email and a PHC string produced by [`hash_password`].
    pub fn new(email: &str, password_hash: &str) -> Result<Self, ValidationError> {
        let email = normalize_identifier(email);
        if email.is_empty() {
            return Err(ValidationError::MissingField(
                "Admin email is required".to_string(),
            ));
        }
        if !password_hash.starts_with('$') {
            return Err(ValidationError::InvalidField(
                "Admin password hash must be a PHC string".to_string(),
            ));
        }
        Ok(Self {
            email,
            password_hash: password_hash.to_string(),
        })
    }

    /// Hash `password` and build the credentials from it.
    pub fn from_plaintext(email: &str, password: &str) -> Result<Self, ValidationError> {
        Self::new(email, &hash_password(password))
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialVerifier for AdminCredentials {
    async fn verify(&self, identifier: &str, secret: &str) -> bool {
        let identifier = normalize_identifier(identifier);
        let email_matches = constant_time_compare(identifier.as_bytes(), self.email.as_bytes());

        // Always run the hash check so timing does not reveal whether the email matched.
        let password_matches = match password_auth::verify_password(secret, &self.password_hash) {
            Ok(()) => true,
            Err(VerifyError::PasswordInvalid) => false,
            Err(e) => {
                tracing::error!(error = %e, "Stored admin password hash could not be parsed");
                false
            }
        };

        email_matches && password_matches
    }
}

/// Hash a password with Argon2 into a PHC string.
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_credentials_verify() {
        let admin = AdminCredentials::from_plaintext("admin@example.com", "correct horse").unwrap();

        assert!(admin.verify("admin@example.com", "correct horse").await);
        assert!(admin.verify("  Admin@Example.com ", "correct horse").await);
        assert!(!admin.verify("admin@example.com", "wrong").await);
        assert!(!admin.verify("other@example.com", "correct horse").await);
        assert!(!admin.verify("", "").await);
    }

    #[tokio::test]
    async fn test_malformed_hash_never_verifies() {
        let admin = AdminCredentials::new("admin@example.com", "$not-a-real-hash").unwrap();
        assert!(!admin.verify("admin@example.com", "anything").await);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            AdminCredentials::new("", "$argon2id$..."),
            Err(ValidationError::MissingField(_))
        ));
        assert!(matches!(
            AdminCredentials::new("admin@example.com", "plaintext"),
            Err(ValidationError::InvalidField(_))
        ));
    }

    #[test]
    fn test_hash_password_is_salted() {
        let a = hash_password("secret");
        let b = hash_password("secret");
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn test_debug_hides_hash() {
        let admin = AdminCredentials::from_plaintext("admin@example.com", "pw").unwrap();
        let debug = format!("{admin:?}");
        assert!(debug.contains("admin@example.com"));
        assert!(!debug.contains("argon2"));
    }
}
