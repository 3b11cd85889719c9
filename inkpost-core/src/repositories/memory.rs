//! In-memory storage backend
//!
//! Keeps everything in [`DashMap`]s. State is lost when the process exits, so this
//! backend suits tests and short-lived tools; use a persistent backend to keep
//! lockouts across restarts.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    AuthAttemptState, ClientKey, Error, SessionToken,
    repositories::{
        AuthStateRepository, AuthStateRepositoryProvider, RepositoryProvider,
        SessionTokenRepository, SessionTokenRepositoryProvider,
    },
};

#[derive(Debug, Default)]
pub struct MemoryAuthStateRepository {
    states: DashMap<ClientKey, AuthAttemptState>,
}

#[async_trait]
impl AuthStateRepository for MemoryAuthStateRepository {
    async fn load(&self, client: &ClientKey) -> Result<Option<AuthAttemptState>, Error> {
        Ok(self.states.get(client).map(|state| *state))
    }

    async fn save(&self, client: &ClientKey, state: &AuthAttemptState) -> Result<(), Error> {
        self.states.insert(client.clone(), *state);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionTokenRepository {
    tokens: DashMap<ClientKey, SessionToken>,
}

#[async_trait]
impl SessionTokenRepository for MemorySessionTokenRepository {
    async fn load(&self, client: &ClientKey) -> Result<Option<SessionToken>, Error> {
        Ok(self.tokens.get(client).map(|token| token.clone()))
    }

    async fn save(&self, client: &ClientKey, token: &SessionToken) -> Result<(), Error> {
        self.tokens.insert(client.clone(), token.clone());
        Ok(())
    }

    async fn clear(&self, client: &ClientKey) -> Result<(), Error> {
        self.tokens.remove(client);
        Ok(())
    }
}

/// Repository provider backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryRepositoryProvider {
    auth_state: Arc<MemoryAuthStateRepository>,
    session_token: Arc<MemorySessionTokenRepository>,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthStateRepositoryProvider for MemoryRepositoryProvider {
    type AuthStateRepo = MemoryAuthStateRepository;

    fn auth_state(&self) -> &Self::AuthStateRepo {
        &self.auth_state
    }
}

impl SessionTokenRepositoryProvider for MemoryRepositoryProvider {
    type SessionTokenRepo = MemorySessionTokenRepository;

    fn session_token(&self) -> &Self::SessionTokenRepo {
        &self.session_token
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
