//! Repository traits for the durable key-value store
//!
//! Services talk to storage only through these traits. Each record is keyed by a
//! [`ClientKey`](crate::ClientKey) and must survive a process restart in every
//! production backend.
//!
//! # Trait Hierarchy
//!
//! - [`AuthStateRepository`] and [`SessionTokenRepository`] define the operations
//! - `*RepositoryProvider` traits hand out each repository
//! - [`RepositoryProvider`] combines both providers with lifecycle methods

pub mod adapter;
pub mod auth_state;
pub mod memory;
pub mod session_token;

pub use adapter::{AuthStateRepositoryAdapter, SessionTokenRepositoryAdapter};
pub use auth_state::AuthStateRepository;
pub use memory::MemoryRepositoryProvider;
pub use session_token::SessionTokenRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for attempt-state repository access.
pub trait AuthStateRepositoryProvider: Send + Sync + 'static {
    /// The attempt-state repository implementation type
    type AuthStateRepo: AuthStateRepository;

    /// Get the attempt-state repository
    fn auth_state(&self) -> &Self::AuthStateRepo;
}

/// Provider trait for session token repository access.
pub trait SessionTokenRepositoryProvider: Send + Sync + 'static {
    /// The session token repository implementation type
    type SessionTokenRepo: SessionTokenRepository;

    /// Get the session token repository
    fn session_token(&self) -> &Self::SessionTokenRepo;
}

/// A complete storage backend.
///
/// Backends implement both provider traits plus the lifecycle methods below, and
/// are then accepted by the services and the `inkpost` facade.
#[async_trait]
pub trait RepositoryProvider:
    AuthStateRepositoryProvider + SessionTokenRepositoryProvider
{
    /// Create or upgrade the storage schema.
    async fn migrate(&self) -> Result<(), Error>;

    /// Check the backend is reachable.
    async fn health_check(&self) -> Result<(), Error>;
}
