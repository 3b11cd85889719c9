use async_trait::async_trait;

use crate::{ClientKey, Error, SessionToken};

/// Durable storage for the session token a client currently holds.
#[async_trait]
pub trait SessionTokenRepository: Send + Sync + 'static {
    /// Load the current token, if any
    async fn load(&self, client: &ClientKey) -> Result<Option<SessionToken>, Error>;

    /// Store `token`, replacing any previous one
    async fn save(&self, client: &ClientKey, token: &SessionToken) -> Result<(), Error>;

    /// Remove the token. Clearing an absent token is not an error.
    async fn clear(&self, client: &ClientKey) -> Result<(), Error>;
}
