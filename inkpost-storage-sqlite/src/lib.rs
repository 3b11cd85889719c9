//! SQLite storage backend for inkpost
//!
//! Persists login attempt state and session tokens in two small tables keyed by
//! client. Point it at a file to keep lockouts across restarts:
//!
//! ```rust,no_run
//! use inkpost_core::RepositoryProvider;
//! use inkpost_storage_sqlite::SqliteRepositoryProvider;
//!
//! # async fn example() -> Result<(), inkpost_core::Error> {
//! let provider = SqliteRepositoryProvider::connect("sqlite://inkpost.db").await?;
//! provider.migrate().await?;
//! # Ok(())
//! # }
//! ```
pub mod migrations;
pub mod repositories;

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use inkpost_core::{
    Error,
    error::StorageError,
    repositories::{AuthStateRepositoryProvider, RepositoryProvider, SessionTokenRepositoryProvider},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use repositories::{SqliteAuthStateRepository, SqliteSessionTokenRepository};

use crate::migrations::SqliteMigrationManager;

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    auth_state: Arc<SqliteAuthStateRepository>,
    session_token: Arc<SqliteSessionTokenRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let auth_state = Arc::new(SqliteAuthStateRepository::new(pool.clone()));
        let session_token = Arc::new(SqliteSessionTokenRepository::new(pool.clone()));

        Self {
            pool,
            auth_state,
            session_token,
        }
    }

    /// Open a pool for `url`, creating the database file if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g. "sqlite::memory:" or "sqlite://inkpost.db")
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(url, error = %e, "Failed to connect to SQLite");
                Error::Storage(StorageError::Connection(e.to_string()))
            })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AuthStateRepositoryProvider for SqliteRepositoryProvider {
    type AuthStateRepo = SqliteAuthStateRepository;

    fn auth_state(&self) -> &Self::AuthStateRepo {
        &self.auth_state
    }
}

impl SessionTokenRepositoryProvider for SqliteRepositoryProvider {
    type SessionTokenRepo = SqliteSessionTokenRepository;

    fn session_token(&self) -> &Self::SessionTokenRepo {
        &self.session_token
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(e.to_string()))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
