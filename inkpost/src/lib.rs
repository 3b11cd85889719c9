//! # Inkpost
//!
//! The admin login gate of the inkpost blog, with brute-force protection that
//! survives restarts.
//!
//! After three consecutive failed logins a client is locked out for three minutes,
//! during which even the correct password is rejected. A successful login hands out
//! an opaque session token that stays valid until logout. Attempt state and tokens
//! are persisted through a [`RepositoryProvider`] (SQLite by default).
//!
//! The crate also re-exports the post helpers the admin form uses to prepare
//! records for the external datastore (see [`post`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use inkpost::{AdminCredentials, ClientKey, InkpostBuilder, LoginOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let admin = AdminCredentials::from_plaintext("admin@example.com", "correct horse")?;
//!
//!     let inkpost = InkpostBuilder::new()
//!         .with_sqlite("sqlite://inkpost.db")
//!         .await?
//!         .with_admin(admin)
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let client = ClientKey::default();
//!     match inkpost.login(&client, "admin@example.com", "correct horse").await? {
//!         LoginOutcome::Success(token) => println!("Logged in: {token}"),
//!         LoginOutcome::InvalidCredentials { remaining_attempts } => {
//!             println!("{remaining_attempts} attempts left")
//!         }
//!         LoginOutcome::LockedOut { remaining_seconds } => {
//!             println!("Locked out for {remaining_seconds}s")
//!         }
//!     }
//!     Ok(())
//! }
//! ```
pub mod builder;
pub mod settings;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use inkpost_core::{
    repositories::{AuthStateRepositoryAdapter, SessionTokenRepositoryAdapter},
    services::LoginGuardService,
};

pub use builder::{InkpostBuilder, InkpostBuilderError, NoStorage, WithStorage};
pub use settings::{Settings, SettingsError};

/// Re-export core types from inkpost_core
pub use inkpost_core::{
    AdminCredentials, AuthAttemptState, ClientKey, CredentialVerifier, Error, LockoutStatus,
    LoginGuardConfig, LoginOutcome, RepositoryProvider, SessionToken, error, hash_password, post,
    repositories,
};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use inkpost_storage_sqlite::SqliteRepositoryProvider;

type Guard<R> = LoginGuardService<AuthStateRepositoryAdapter<R>, SessionTokenRepositoryAdapter<R>>;

/// The login gate, wired to a storage backend and a credential verifier.
///
/// Construct it with [`InkpostBuilder`] or [`Inkpost::new`].
pub struct Inkpost<R: RepositoryProvider> {
    repositories: Arc<R>,
    guard: Arc<Guard<R>>,
}

impl<R: RepositoryProvider> Inkpost<R> {
    /// Create a new Inkpost instance with a repository provider
    ///
    /// # Arguments
    ///
    /// * `repositories` - The repository provider implementation
    /// * `verifier` - Checks submitted credentials
    /// * `config` - Lockout policy
    pub fn new(
        repositories: Arc<R>,
        verifier: Arc<dyn CredentialVerifier>,
        config: LoginGuardConfig,
    ) -> Self {
        let guard = LoginGuardService::new(
            Arc::new(AuthStateRepositoryAdapter::new(repositories.clone())),
            Arc::new(SessionTokenRepositoryAdapter::new(repositories.clone())),
            verifier,
            config,
        );

        Self {
            repositories,
            guard: Arc::new(guard),
        }
    }

    /// Create or upgrade the storage schema.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    pub fn config(&self) -> &LoginGuardConfig {
        self.guard.config()
    }

    /// Attempt a login as of `now`.
    ///
    /// See [`LoginGuardService::attempt_login`] for the full semantics.
    pub async fn attempt_login(
        &self,
        client: &ClientKey,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, Error> {
        self.guard.attempt_login(client, email, password, now).await
    }

    /// Attempt a login against the system clock.
    pub async fn login(
        &self,
        client: &ClientKey,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, Error> {
        self.guard.login(client, email, password).await
    }

    /// Discard the client's session. Never fails and may be repeated.
    pub async fn logout(&self, client: &ClientKey) {
        self.guard.logout(client).await
    }

    /// The client's lockout state right now.
    pub async fn lockout_status(&self, client: &ClientKey) -> LockoutStatus {
        self.lockout_status_at(client, Utc::now()).await
    }

    pub async fn lockout_status_at(&self, client: &ClientKey, now: DateTime<Utc>) -> LockoutStatus {
        self.guard.lockout_status(client, now).await
    }

    /// Reset the client's failed attempts, lifting any lockout.
    ///
    /// Returns whether the client was locked out.
    pub async fn unlock(&self, client: &ClientKey) -> Result<bool, Error> {
        self.guard.unlock(client).await
    }

    pub async fn unlock_at(&self, client: &ClientKey, now: DateTime<Utc>) -> Result<bool, Error> {
        self.guard.unlock_at(client, now).await
    }

    pub async fn current_session(&self, client: &ClientKey) -> Option<SessionToken> {
        self.guard.sessions().current(client).await
    }

    pub async fn is_authenticated(&self, client: &ClientKey) -> bool {
        self.guard.sessions().is_authenticated(client).await
    }

    /// Check a token presented by the client against the one on record.
    pub async fn validate_session(&self, client: &ClientKey, presented: &str) -> bool {
        self.guard.sessions().validate(client, presented).await
    }
}

impl<R: RepositoryProvider> Clone for Inkpost<R> {
    fn clone(&self) -> Self {
        Self {
            repositories: self.repositories.clone(),
            guard: self.guard.clone(),
        }
    }
}
