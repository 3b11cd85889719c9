//! SQLite implementation of the login attempt state repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inkpost_core::{
    AuthAttemptState, ClientKey, Error,
    error::{
        StorageError,
        utilities::StorageResultExt,
    },
    repositories::AuthStateRepository,
};
use sqlx::SqlitePool;

pub struct SqliteAuthStateRepository {
    pool: SqlitePool,
}

impl SqliteAuthStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAuthState {
    attempts: i64,
    blocked_until: Option<i64>,
}

impl TryFrom<SqliteAuthState> for AuthAttemptState {
    type Error = Error;

    fn try_from(row: SqliteAuthState) -> Result<Self, Self::Error> {
        let attempts = u32::try_from(row.attempts).map_err(|_| {
            StorageError::Corrupt(format!("attempts out of range: {}", row.attempts))
        })?;
        let blocked_until = row
            .blocked_until
            .map(|ms| {
                DateTime::<Utc>::from_timestamp_millis(ms)
                    .ok_or_else(|| StorageError::Corrupt(format!("invalid blocked_until: {ms}")))
            })
            .transpose()?;

        Ok(AuthAttemptState {
            attempts,
            blocked_until,
        })
    }
}

#[async_trait]
impl AuthStateRepository for SqliteAuthStateRepository {
    async fn load(&self, client: &ClientKey) -> Result<Option<AuthAttemptState>, Error> {
        let row = sqlx::query_as::<_, SqliteAuthState>(
            "SELECT attempts, blocked_until FROM auth_state WHERE client_key = ?",
        )
        .bind(client.as_str())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(client = %client, error = %e, "Failed to load auth state"))
        .map_db_err()?;

        row.map(AuthAttemptState::try_from).transpose()
    }

    async fn save(&self, client: &ClientKey, state: &AuthAttemptState) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO auth_state (client_key, attempts, blocked_until, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(client_key) DO UPDATE SET
                attempts = excluded.attempts,
                blocked_until = excluded.blocked_until,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(client.as_str())
        .bind(i64::from(state.attempts))
        .bind(state.blocked_until.map(|t| t.timestamp_millis()))
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(client = %client, error = %e, "Failed to save auth state"))
        .map_persist_err("Failed to save auth state")?;

        Ok(())
    }
}
