use async_trait::async_trait;
use chrono::Utc;
use inkpost_core::{
    ClientKey, Error, SessionToken, error::utilities::StorageResultExt,
    repositories::SessionTokenRepository,
};
use sqlx::SqlitePool;

pub struct SqliteSessionTokenRepository {
    pool: SqlitePool,
}

impl SqliteSessionTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionTokenRepository for SqliteSessionTokenRepository {
    async fn load(&self, client: &ClientKey) -> Result<Option<SessionToken>, Error> {
        let token: Option<String> =
            sqlx::query_scalar("SELECT token FROM session_tokens WHERE client_key = ?")
                .bind(client.as_str())
                .fetch_optional(&self.pool)
                .await
                .inspect_err(|e| {
                    tracing::error!(client = %client, error = %e, "Failed to load session token")
                })
                .map_db_err()?;

        Ok(token.map(SessionToken::from))
    }

    async fn save(&self, client: &ClientKey, token: &SessionToken) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO session_tokens (client_key, token, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(client_key) DO UPDATE SET
                token = excluded.token,
                created_at = excluded.created_at
            "#,
        )
        .bind(client.as_str())
        .bind(token.as_str())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(client = %client, error = %e, "Failed to save session token"))
        .map_persist_err("Failed to save session token")?;

        Ok(())
    }

    async fn clear(&self, client: &ClientKey) -> Result<(), Error> {
        sqlx::query("DELETE FROM session_tokens WHERE client_key = ?")
            .bind(client.as_str())
            .execute(&self.pool)
            .await
            .inspect_err(|e| {
                tracing::error!(client = %client, error = %e, "Failed to clear session token")
            })
            .map_persist_err("Failed to clear session token")?;

        Ok(())
    }
}
