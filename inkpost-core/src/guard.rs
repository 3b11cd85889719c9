//! Login attempt guard types
//!
//! The guard tracks consecutive failed logins for one client in an [`AuthAttemptState`]
//! and moves between two states:
//!
//! | State              | Meaning                                                   |
//! | ------------------ | --------------------------------------------------------- |
//! | `Unlocked(n)`      | `n < max_attempts` consecutive failures, logins evaluated |
//! | `LockedOut(until)` | every attempt rejected until the instant `until`          |
//!
//! A failure that reaches `max_attempts` locks the client out. The lockout is lifted
//! lazily: nothing runs when it expires, the next attempt after `until` simply starts
//! again from zero attempts. A successful login always returns to `Unlocked(0)`.
//!
//! Everything here is pure; persistence and credential checks are done by
//! [`LoginGuardService`](crate::services::LoginGuardService).

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuthError, ValidationError},
    session::SessionToken,
};

/// Default number of consecutive failures that triggers a lockout.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default lockout length in seconds.
pub const DEFAULT_LOCKOUT_SECONDS: i64 = 180;

/// Longest lockout a policy may configure (one year).
pub const MAX_LOCKOUT_SECONDS: i64 = 365 * 24 * 60 * 60;

const MAX_CLIENT_KEY_LEN: usize = 255;

/// Key under which a client's attempt state and session token are stored.
///
/// A single browser uses one key for its whole lifetime. A server guarding many
/// clients keys per account or per source address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: &str) -> Result<Self, ValidationError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::InvalidClientKey(
                "Client key must not be empty".to_string(),
            ));
        }
        if key.len() > MAX_CLIENT_KEY_LEN {
            return Err(ValidationError::InvalidClientKey(format!(
                "Client key must be at most {MAX_CLIENT_KEY_LEN} bytes"
            )));
        }
        Ok(ClientKey(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientKey {
    fn default() -> Self {
        ClientKey("default".to_string())
    }
}

impl FromStr for ClientKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClientKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ClientKey> for String {
    fn from(key: ClientKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lockout policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGuardConfig {
    /// Consecutive failures that trigger a lockout
    pub max_attempts: u32,
    /// How long a lockout lasts
    pub lockout_duration: Duration,
}

impl Default for LoginGuardConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_duration: Duration::seconds(DEFAULT_LOCKOUT_SECONDS),
        }
    }
}

impl LoginGuardConfig {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Result<Self, ValidationError> {
        let config = Self {
            max_attempts,
            lockout_duration,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_lockout_duration(mut self, lockout_duration: Duration) -> Self {
        self.lockout_duration = lockout_duration;
        self
    }

    /// Lockout length in whole seconds, rounded up.
    pub fn lockout_seconds(&self) -> i64 {
        ceil_seconds(self.lockout_duration)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.lockout_duration <= Duration::zero() {
            return Err(ValidationError::InvalidConfig(
                "lockout_duration must be positive".to_string(),
            ));
        }
        if self.lockout_duration > Duration::seconds(MAX_LOCKOUT_SECONDS) {
            return Err(ValidationError::InvalidConfig(format!(
                "lockout_duration must be at most {MAX_LOCKOUT_SECONDS} seconds"
            )));
        }
        Ok(())
    }
}

/// Persisted attempt state for one client.
///
/// Serialized as `{"attempts": 2, "blockedUntil": 1717171717000}` with the instant in
/// Unix milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAttemptState {
    /// Consecutive failures since the last success or lockout expiry
    pub attempts: u32,
    /// When the current lockout ends, if any
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub blocked_until: Option<DateTime<Utc>>,
}

impl AuthAttemptState {
    /// Whether a lockout is in force at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    /// Seconds until the lockout ends, rounded up, or `None` when not locked at `now`.
    pub fn remaining_lockout_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.blocked_until
            .filter(|until| now < *until)
            .map(|until| ceil_seconds(until - now))
    }

    /// Clear a lockout whose window has passed. Returns `true` if the state changed.
    pub fn expire_lockout(&mut self, now: DateTime<Utc>) -> bool {
        match self.blocked_until {
            Some(until) if now >= until => {
                *self = AuthAttemptState::default();
                true
            }
            _ => false,
        }
    }

    /// Count one failed attempt and lock the client out once the threshold is reached.
    ///
    /// Must only be called while not locked at `now`.
    pub fn record_failure(&mut self, now: DateTime<Utc>, config: &LoginGuardConfig) -> LoginOutcome {
        self.attempts = self.attempts.saturating_add(1).min(config.max_attempts);

        if self.attempts >= config.max_attempts {
            // Saturates for configs built without validation.
            self.blocked_until = Some(
                now.checked_add_signed(config.lockout_duration)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            );
            LoginOutcome::LockedOut {
                remaining_seconds: config.lockout_seconds(),
            }
        } else {
            LoginOutcome::InvalidCredentials {
                remaining_attempts: config.max_attempts - self.attempts,
            }
        }
    }

    /// Project the state into a [`LockoutStatus`] as seen at `now`.
    pub fn status_at(&self, client: &ClientKey, now: DateTime<Utc>) -> LockoutStatus {
        if self.is_locked_at(now) {
            LockoutStatus {
                client: client.clone(),
                failed_attempts: self.attempts,
                is_locked: true,
                locked_until: self.blocked_until,
                evaluated_at: now,
            }
        } else if self.blocked_until.is_some() {
            // Lockout elapsed but not yet reset by an attempt.
            LockoutStatus {
                client: client.clone(),
                failed_attempts: 0,
                is_locked: false,
                locked_until: None,
                evaluated_at: now,
            }
        } else {
            LockoutStatus {
                client: client.clone(),
                failed_attempts: self.attempts,
                is_locked: false,
                locked_until: None,
                evaluated_at: now,
            }
        }
    }
}

/// Read-only view of a client's lockout state at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockoutStatus {
    pub client: ClientKey,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    pub evaluated_at: DateTime<Utc>,
}

impl LockoutStatus {
    /// Seconds until the client may try again, suitable for a `Retry-After` header.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        self.locked_until
            .filter(|_| self.is_locked)
            .map(|until| ceil_seconds(until - self.evaluated_at))
    }
}

/// Result of a login attempt that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials accepted; the client now holds this token
    Success(SessionToken),
    /// Credentials rejected; this many tries remain before a lockout
    InvalidCredentials { remaining_attempts: u32 },
    /// The client is locked out for this many more seconds
    LockedOut { remaining_seconds: i64 },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success(_))
    }

    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            LoginOutcome::Success(token) => Some(token),
            _ => None,
        }
    }

    /// Turn rejected outcomes into [`AuthError`]s.
    pub fn into_result(self) -> Result<SessionToken, AuthError> {
        match self {
            LoginOutcome::Success(token) => Ok(token),
            LoginOutcome::InvalidCredentials { remaining_attempts } => {
                Err(AuthError::InvalidCredentials { remaining_attempts })
            }
            LoginOutcome::LockedOut { remaining_seconds } => Err(AuthError::LockedOut {
                retry_after_seconds: remaining_seconds,
            }),
        }
    }
}

/// Whole seconds in `delta`, rounding any fraction up. Non-positive deltas give 0.
fn ceil_seconds(delta: Duration) -> i64 {
    if delta <= Duration::zero() {
        return 0;
    }
    let secs = delta.num_seconds();
    if delta.subsec_nanos() > 0 { secs + 1 } else { secs }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = LoginGuardConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.lockout_duration, Duration::seconds(180));
        assert_eq!(config.lockout_seconds(), 180);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_values() {
        assert!(LoginGuardConfig::new(0, Duration::seconds(10)).is_err());
        assert!(LoginGuardConfig::new(3, Duration::zero()).is_err());
        assert!(LoginGuardConfig::new(3, Duration::seconds(-1)).is_err());
        assert!(LoginGuardConfig::new(1, Duration::milliseconds(1)).is_ok());
    }

    #[test]
    fn test_config_rejects_oversized_lockout() {
        let max = Duration::seconds(MAX_LOCKOUT_SECONDS);
        assert!(LoginGuardConfig::new(3, max).is_ok());
        assert!(matches!(
            LoginGuardConfig::new(3, max + Duration::seconds(1)),
            Err(ValidationError::InvalidConfig(_))
        ));
        assert!(LoginGuardConfig::new(3, Duration::MAX).is_err());
    }

    #[test]
    fn test_record_failure_with_huge_lockout_does_not_overflow() {
        let config = LoginGuardConfig {
            max_attempts: 1,
            lockout_duration: Duration::MAX,
        };
        let mut state = AuthAttemptState::default();

        let outcome = state.record_failure(at(0), &config);

        assert!(matches!(outcome, LoginOutcome::LockedOut { .. }));
        assert_eq!(state.blocked_until, Some(DateTime::<Utc>::MAX_UTC));
        assert!(state.is_locked_at(at(0)));
    }

    #[test]
    fn test_client_key_validation() {
        assert_eq!(ClientKey::new("  browser-1 ").unwrap().as_str(), "browser-1");
        assert!(ClientKey::new("").is_err());
        assert!(ClientKey::new("   ").is_err());
        assert!(ClientKey::new(&"x".repeat(256)).is_err());
        assert_eq!(ClientKey::default().as_str(), "default");
        assert_eq!("admin@example.com".parse::<ClientKey>().unwrap().to_string(), "admin@example.com");
    }

    #[test]
    fn test_failures_count_down_then_lock() {
        let config = LoginGuardConfig::default();
        let mut state = AuthAttemptState::default();

        assert_eq!(
            state.record_failure(at(0), &config),
            LoginOutcome::InvalidCredentials { remaining_attempts: 2 }
        );
        assert_eq!(
            state.record_failure(at(1), &config),
            LoginOutcome::InvalidCredentials { remaining_attempts: 1 }
        );
        assert_eq!(
            state.record_failure(at(2), &config),
            LoginOutcome::LockedOut { remaining_seconds: 180 }
        );
        assert_eq!(state.attempts, 3);
        assert_eq!(state.blocked_until, Some(at(182)));
    }

    #[test]
    fn test_attempts_never_exceed_max() {
        let config = LoginGuardConfig::default().with_max_attempts(2);
        let mut state = AuthAttemptState {
            attempts: 2,
            blocked_until: None,
        };
        state.record_failure(at(0), &config);
        assert_eq!(state.attempts, 2);
    }

    #[test]
    fn test_remaining_lockout_seconds_rounds_up() {
        let state = AuthAttemptState {
            attempts: 3,
            blocked_until: Some(at(100)),
        };
        assert_eq!(state.remaining_lockout_seconds(at(10)), Some(90));
        let just_after = at(10) + Duration::milliseconds(1);
        assert_eq!(state.remaining_lockout_seconds(just_after), Some(90));
        let almost_done = at(100) - Duration::milliseconds(1);
        assert_eq!(state.remaining_lockout_seconds(almost_done), Some(1));
        assert_eq!(state.remaining_lockout_seconds(at(100)), None);
    }

    #[test]
    fn test_expire_lockout() {
        let mut state = AuthAttemptState {
            attempts: 3,
            blocked_until: Some(at(100)),
        };
        assert!(!state.expire_lockout(at(99)));
        assert_eq!(state.attempts, 3);

        assert!(state.expire_lockout(at(100)));
        assert_eq!(state, AuthAttemptState::default());

        // Nothing to expire
        assert!(!state.expire_lockout(at(200)));
    }

    #[test]
    fn test_status_at() {
        let client = ClientKey::default();
        let locked = AuthAttemptState {
            attempts: 3,
            blocked_until: Some(at(180)),
        };

        let status = locked.status_at(&client, at(90));
        assert!(status.is_locked);
        assert_eq!(status.failed_attempts, 3);
        assert_eq!(status.retry_after_seconds(), Some(90));

        let status = locked.status_at(&client, at(180));
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
        assert_eq!(status.retry_after_seconds(), None);

        let partial = AuthAttemptState {
            attempts: 1,
            blocked_until: None,
        };
        let status = partial.status_at(&client, at(0));
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 1);
    }

    #[test]
    fn test_into_result() {
        let token = SessionToken::new("tok");
        assert_eq!(
            LoginOutcome::Success(token.clone()).into_result().unwrap(),
            token
        );
        assert_eq!(
            LoginOutcome::InvalidCredentials { remaining_attempts: 1 }
                .into_result()
                .unwrap_err(),
            AuthError::InvalidCredentials { remaining_attempts: 1 }
        );
        assert_eq!(
            LoginOutcome::LockedOut { remaining_seconds: 42 }
                .into_result()
                .unwrap_err(),
            AuthError::LockedOut { retry_after_seconds: 42 }
        );
    }

    #[test]
    fn test_state_json_shape() {
        let state = AuthAttemptState {
            attempts: 2,
            blocked_until: Some(DateTime::from_timestamp_millis(1_717_171_717_000).unwrap()),
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"attempts": 2, "blockedUntil": 1_717_171_717_000_i64})
        );

        let fresh: AuthAttemptState =
            serde_json::from_str(r#"{"attempts":0,"blockedUntil":null}"#).unwrap();
        assert_eq!(fresh, AuthAttemptState::default());
    }
}
