use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    AuthAttemptState, ClientKey, Error, SessionToken,
    repositories::{
        AuthStateRepository, AuthStateRepositoryProvider, RepositoryProvider,
        SessionTokenRepository, SessionTokenRepositoryProvider,
    },
};

/// Exposes a provider's attempt-state repository as a standalone [`AuthStateRepository`].
pub struct AuthStateRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AuthStateRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AuthStateRepository for AuthStateRepositoryAdapter<R> {
    async fn load(&self, client: &ClientKey) -> Result<Option<AuthAttemptState>, Error> {
        self.provider.auth_state().load(client).await
    }

    async fn save(&self, client: &ClientKey, state: &AuthAttemptState) -> Result<(), Error> {
        self.provider.auth_state().save(client, state).await
    }
}

pub struct SessionTokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionTokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionTokenRepository for SessionTokenRepositoryAdapter<R> {
    async fn load(&self, client: &ClientKey) -> Result<Option<SessionToken>, Error> {
        self.provider.session_token().load(client).await
    }

    async fn save(&self, client: &ClientKey, token: &SessionToken) -> Result<(), Error> {
        self.provider.session_token().save(client, token).await
    }

    async fn clear(&self, client: &ClientKey) -> Result<(), Error> {
        self.provider.session_token().clear(client).await
    }
}
