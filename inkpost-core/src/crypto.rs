//! Random token generation and constant-time comparison
//!
//! Session tokens are 256-bit values from the OS random number generator, encoded as
//! URL-safe base64. Comparing a presented token against the stored one goes through
//! [`constant_time_compare`] so the comparison does not leak how many leading bytes matched.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use crate::{Error, error::SessionError};

/// Number of random bytes behind every session token.
pub const TOKEN_BYTES: usize = 32;

/// Generate a cryptographically secure random token.
///
/// Produces 256 bits of entropy encoded as URL-safe base64 without padding
/// (43 characters).
///
/// # Errors
///
/// Returns [`SessionError::InvalidToken`] if the OS random number generator is
/// unavailable. No token is issued in that case.
pub fn generate_secure_token() -> Result<String, Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::InvalidToken(format!("OS RNG failure: {e}")))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

/// Compare two byte slices in constant time.
///
/// Slices of different length compare unequal immediately; the length of a
/// session token is not secret.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
