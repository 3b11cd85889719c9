//! Service layer
//!
//! Services hold the login policy and session handling. They depend only on the
//! repository traits, never on a concrete backend.

pub mod login_guard;
pub mod session;

pub use login_guard::LoginGuardService;
pub use session::SessionService;
