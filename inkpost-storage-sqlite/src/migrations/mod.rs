//! Schema migrations for the SQLite backend.
//!
//! Applied versions are tracked in the `_inkpost_migrations` table. Each migration
//! runs in its own transaction together with its bookkeeping row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

pub const MIGRATION_TABLE: &str = "_inkpost_migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[async_trait]
pub trait Migration: Send + Sync {
    /// Execute the migration
    async fn up<'a>(&'a self, conn: &'a mut SqliteConnection) -> Result<()>;

    /// Rollback the migration
    async fn down<'a>(&'a self, conn: &'a mut SqliteConnection) -> Result<()>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64,
}

/// Every migration this backend knows about, in version order.
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateAuthStateTable),
        Box::new(CreateSessionTokensTable),
    ]
}

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the tracking table if needed.
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply every migration that is not yet recorded, in the given order.
    pub async fn up(&self, migrations: &[Box<dyn Migration>]) -> Result<()> {
        check_versions(migrations)?;

        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applying migration"
            );

            migration.up(&mut *tx).await?;

            sqlx::query(&format!(
                "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
            ))
            .bind(migration.version())
            .bind(migration.name())
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    /// Roll back applied migrations, newest first.
    pub async fn down(&self, migrations: &[Box<dyn Migration>]) -> Result<()> {
        for migration in migrations.iter().rev() {
            if !self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Rolling back migration"
            );

            migration.down(&mut *tx).await?;

            sqlx::query(&format!("DELETE FROM {MIGRATION_TABLE} WHERE version = ?"))
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>> {
        let records = sqlx::query_as::<_, MigrationRecord>(&format!(
            "SELECT version, name, applied_at FROM {MIGRATION_TABLE} ORDER BY version"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn is_applied(&self, version: i64) -> Result<bool> {
        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {MIGRATION_TABLE} WHERE version = ?)"
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}

fn check_versions(migrations: &[Box<dyn Migration>]) -> Result<()> {
    for pair in migrations.windows(2) {
        if pair[0].version() >= pair[1].version() {
            return Err(MigrationError::Migration(format!(
                "Migration {} ({}) is out of order",
                pair[1].name(),
                pair[1].version()
            )));
        }
    }
    Ok(())
}

pub struct CreateAuthStateTable;

#[async_trait]
impl Migration for CreateAuthStateTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateAuthStateTable"
    }

    async fn up<'a>(&'a self, conn: &'a mut SqliteConnection) -> Result<()> {
        // blocked_until is Unix milliseconds.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS auth_state (
                client_key TEXT PRIMARY KEY,
                attempts INTEGER NOT NULL DEFAULT 0 CHECK (attempts >= 0),
                blocked_until INTEGER,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(&'a self, conn: &'a mut SqliteConnection) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS auth_state")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateSessionTokensTable;

#[async_trait]
impl Migration for CreateSessionTokensTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateSessionTokensTable"
    }

    async fn up<'a>(&'a self, conn: &'a mut SqliteConnection) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_tokens (
                client_key TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(&'a self, conn: &'a mut SqliteConnection) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS session_tokens")
            .execute(conn)
            .await?;
        Ok(())
    }
}
