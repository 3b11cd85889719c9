//! Builder pattern for constructing Inkpost instances
//!
//! This module provides a type-safe builder for creating [`Inkpost`] instances with
//! compile-time validation of storage configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use inkpost::{AdminCredentials, InkpostBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inkpost = InkpostBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .with_admin(AdminCredentials::from_plaintext("admin@example.com", "secret")?)
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     inkpost.health_check().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Duration;
use inkpost_core::{AdminCredentials, CredentialVerifier, LoginGuardConfig, RepositoryProvider};

use crate::Inkpost;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building an Inkpost instance.
#[derive(Debug, thiserror::Error)]
pub enum InkpostBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Inkpost`] instances.
///
/// Storage must be configured before [`build`](InkpostBuilder::build) becomes
/// available, and a credential verifier must be supplied before it succeeds.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build or add more configuration
pub struct InkpostBuilder<Storage> {
    storage: Storage,
    guard_config: LoginGuardConfig,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    apply_migrations: bool,
}

impl Default for InkpostBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl InkpostBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: 3 failed attempts, 180 second lockout
    /// - Credential verifier: None (required)
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            guard_config: LoginGuardConfig::default(),
            verifier: None,
            apply_migrations: false,
        }
    }

    /// Use an already constructed repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> InkpostBuilder<WithStorage<R>> {
        InkpostBuilder {
            storage: WithStorage { repositories },
            guard_config: self.guard_config,
            verifier: self.verifier,
            apply_migrations: self.apply_migrations,
        }
    }
}

// ============================================================================
// Storage Configuration Methods (NoStorage -> WithStorage)
// ============================================================================

#[cfg(feature = "sqlite")]
impl InkpostBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// The database file is created if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/inkpost.db")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<InkpostBuilder<WithStorage<crate::SqliteRepositoryProvider>>, InkpostBuilderError>
    {
        let provider = crate::SqliteRepositoryProvider::connect(url)
            .await
            .map_err(|e| InkpostBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(provider)))
    }

    /// Configure SQLite storage with an existing connection pool.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> InkpostBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }
}

// ============================================================================
// Configuration Methods (available after storage is configured)
// ============================================================================

impl<R: RepositoryProvider> InkpostBuilder<WithStorage<R>> {
    /// Replace the whole lockout policy.
    ///
    /// Default: 3 attempts, 180 second lockout
    pub fn with_guard_config(mut self, config: LoginGuardConfig) -> Self {
        self.guard_config = config;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.guard_config.max_attempts = max_attempts;
        self
    }

    pub fn with_lockout_duration(mut self, duration: Duration) -> Self {
        self.guard_config.lockout_duration = duration;
        self
    }

    /// Check logins against a single administrator account.
    pub fn with_admin(self, admin: AdminCredentials) -> Self {
        self.with_verifier(Arc::new(admin))
    }

    /// Check logins with a custom verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Set whether to automatically apply database migrations during build.
    ///
    /// Default: false
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Build the Inkpost instance.
    ///
    /// Fails if the lockout policy is invalid, no verifier was configured, or
    /// requested migrations fail.
    pub async fn build(self) -> Result<Inkpost<R>, InkpostBuilderError> {
        self.guard_config
            .validate()
            .map_err(|e| InkpostBuilderError::InvalidConfiguration(e.to_string()))?;

        let verifier = self.verifier.ok_or_else(|| {
            InkpostBuilderError::InvalidConfiguration(
                "a credential verifier is required".to_string(),
            )
        })?;

        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| InkpostBuilderError::Migration(e.to_string()))?;
        }

        Ok(Inkpost::new(
            self.storage.repositories,
            verifier,
            self.guard_config,
        ))
    }
}
