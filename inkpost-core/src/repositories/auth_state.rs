use async_trait::async_trait;

use crate::{AuthAttemptState, ClientKey, Error};

/// Durable storage for per-client login attempt state.
#[async_trait]
pub trait AuthStateRepository: Send + Sync + 'static {
    /// Load the stored state, or `None` if the client has never been seen.
    async fn load(&self, client: &ClientKey) -> Result<Option<AuthAttemptState>, Error>;

    /// Replace the stored state.
    ///
    /// Failures must be reported as
    /// [`StorageError::Persistence`](crate::error::StorageError::Persistence) so the
    /// guard can surface them instead of silently losing a lockout.
    async fn save(&self, client: &ClientKey, state: &AuthAttemptState) -> Result<(), Error>;
}
