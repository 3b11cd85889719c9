//! Core functionality for inkpost
//!
//! This crate contains the building blocks of the inkpost admin login gate:
//!
//! - [`LoginGuardService`](services::LoginGuardService): counts failed login attempts per
//!   client and enforces a temporary lockout once a threshold is reached.
//! - [`SessionService`](services::SessionService): issues, loads and discards the opaque
//!   [`SessionToken`] handed out after a successful login.
//! - [`CredentialVerifier`]: the seam through which credentials are checked, with
//!   [`AdminCredentials`] as the default single-administrator implementation.
//! - Repository traits in [`repositories`] describing the durable key-value store the
//!   services persist to, plus an in-memory implementation.
//! - [`post`]: the post record handed to the external datastore and the helpers the
//!   admin form uses to prepare it (slugs, excerpts, categories).
//!
//! Storage backends live in their own crates (see `inkpost-storage-sqlite`) and only
//! need to implement the traits in [`repositories`].
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod guard;
pub mod post;
pub mod repositories;
pub mod services;
pub mod session;

pub use credentials::{AdminCredentials, CredentialVerifier, hash_password};
pub use error::Error;
pub use guard::{AuthAttemptState, ClientKey, LockoutStatus, LoginGuardConfig, LoginOutcome};
pub use post::{Category, CategoryInfo, Post, PostDraft};
pub use repositories::RepositoryProvider;
pub use session::SessionToken;
