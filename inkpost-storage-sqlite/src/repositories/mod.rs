//! Repository implementations for SQLite storage

pub mod auth_state;
pub mod session_token;

pub use auth_state::SqliteAuthStateRepository;
pub use session_token::SqliteSessionTokenRepository;
