use std::sync::Arc;

use crate::{
    ClientKey, Error, SessionToken, error::StorageError, repositories::SessionTokenRepository,
};

/// Issues, looks up and discards the session token held by each client.
pub struct SessionService<R: SessionTokenRepository> {
    repository: Arc<R>,
}

impl<R: SessionTokenRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Generate a fresh token for `client` and store it, replacing any previous one.
    pub async fn issue(&self, client: &ClientKey) -> Result<SessionToken, Error> {
        let token = SessionToken::new_random()?;
        self.repository
            .save(client, &token)
            .await
            .map_err(|e| {
                tracing::error!(client = %client, error = %e, "Failed to store session token");
                match e {
                    Error::Storage(StorageError::Persistence(_)) => e,
                    other => Error::Storage(StorageError::Persistence(other.to_string())),
                }
            })?;
        Ok(token)
    }

    /// The token `client` currently holds. Unreadable storage counts as no token.
    pub async fn current(&self, client: &ClientKey) -> Option<SessionToken> {
        match self.repository.load(client).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(client = %client, error = %e, "Failed to load session token");
                None
            }
        }
    }

    pub async fn is_authenticated(&self, client: &ClientKey) -> bool {
        self.current(client).await.is_some()
    }

    /// Check a token presented by `client` against the stored one.
    pub async fn validate(&self, client: &ClientKey, presented: &str) -> bool {
        self.current(client)
            .await
            .is_some_and(|token| token.matches(presented))
    }

    /// Discard the token. Idempotent; storage errors are logged, not returned.
    pub async fn end(&self, client: &ClientKey) {
        if let Err(e) = self.repository.clear(client).await {
            tracing::warn!(client = %client, error = %e, "Failed to clear session token");
        }
    }
}
