//! Brute force protection for the admin login.
//!
//! [`LoginGuardService`] wraps credential verification in a lockout policy: after
//! `max_attempts` consecutive failures a client is rejected outright, even with the
//! right password, until `lockout_duration` has passed. The attempt state is read
//! from and written back to an [`AuthStateRepository`] on every call so it survives
//! restarts.
//!
//! # Example
//!
//! ```rust,ignore
//! use inkpost_core::{ClientKey, LoginGuardConfig, LoginOutcome};
//! use inkpost_core::services::LoginGuardService;
//!
//! let guard = LoginGuardService::new(states, tokens, verifier, LoginGuardConfig::default());
//!
//! match guard.attempt_login(&ClientKey::default(), email, password, Utc::now()).await? {
//!     LoginOutcome::Success(token) => { /* hand the token to the client */ }
//!     LoginOutcome::InvalidCredentials { remaining_attempts } => { /* ... */ }
//!     LoginOutcome::LockedOut { remaining_seconds } => { /* ... */ }
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{
    AuthAttemptState, ClientKey, CredentialVerifier, Error, LockoutStatus, LoginGuardConfig,
    LoginOutcome,
    error::StorageError,
    repositories::{AuthStateRepository, SessionTokenRepository},
    services::SessionService,
};

/// Gates logins behind the lockout policy in [`LoginGuardConfig`].
///
/// # Thread Safety
///
/// The service can be shared across tasks. Calls that modify a client's state hold
/// a per-client lock for the whole read-modify-write, so concurrent failures for the
/// same client are all counted. Different clients never wait on each other.
pub struct LoginGuardService<S: AuthStateRepository, T: SessionTokenRepository> {
    state_repository: Arc<S>,
    sessions: SessionService<T>,
    verifier: Arc<dyn CredentialVerifier>,
    config: LoginGuardConfig,
    locks: DashMap<ClientKey, Arc<Mutex<()>>>,
}

impl<S: AuthStateRepository, T: SessionTokenRepository> LoginGuardService<S, T> {
    /// Create a new LoginGuardService.
    ///
    /// # Arguments
    ///
    /// * `state_repository` - Where attempt state is persisted
    /// * `token_repository` - Where issued session tokens are persisted
    /// * `verifier` - Decides whether a credential pair is valid
    /// * `config` - Lockout policy
    pub fn new(
        state_repository: Arc<S>,
        token_repository: Arc<T>,
        verifier: Arc<dyn CredentialVerifier>,
        config: LoginGuardConfig,
    ) -> Self {
        Self {
            state_repository,
            sessions: SessionService::new(token_repository),
            verifier,
            config,
            locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LoginGuardConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionService<T> {
        &self.sessions
    }

    /// Attempt a login for `client` as of the instant `now`.
    ///
    /// Rejected credentials and lockouts are ordinary [`LoginOutcome`]s. An `Err` means
    /// the outcome could not be recorded (see
    /// [`StorageError::Persistence`](crate::error::StorageError::Persistence)); the
    /// attempt is then indeterminate and the user should retry.
    pub async fn attempt_login(
        &self,
        client: &ClientKey,
        identifier: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, Error> {
        let lock = self.client_lock(client);
        let result = {
            let _held = lock.lock().await;
            self.evaluate_attempt(client, identifier, secret, now).await
        };
        drop(lock);
        self.release_client_lock(client);
        result
    }

    /// [`attempt_login`](Self::attempt_login) against the system clock.
    pub async fn login(
        &self,
        client: &ClientKey,
        identifier: &str,
        secret: &str,
    ) -> Result<LoginOutcome, Error> {
        self.attempt_login(client, identifier, secret, Utc::now())
            .await
    }

    /// Discard the client's session token. Attempt state is left as is.
    pub async fn logout(&self, client: &ClientKey) {
        self.sessions.end(client).await;
        tracing::debug!(client = %client, "Logged out");
    }

    /// The client's lockout state as seen at `now`. Does not modify anything.
    pub async fn lockout_status(&self, client: &ClientKey, now: DateTime<Utc>) -> LockoutStatus {
        self.load_state(client).await.status_at(client, now)
    }

    /// [`unlock_at`](Self::unlock_at) against the system clock.
    pub async fn unlock(&self, client: &ClientKey) -> Result<bool, Error> {
        self.unlock_at(client, Utc::now()).await
    }

    /// Clear the client's attempt state regardless of any lockout.
    ///
    /// # Returns
    ///
    /// `true` if the client was locked out at `now`.
    pub async fn unlock_at(&self, client: &ClientKey, now: DateTime<Utc>) -> Result<bool, Error> {
        let lock = self.client_lock(client);
        let result = {
            let _held = lock.lock().await;
            let was_locked = self.load_state(client).await.is_locked_at(now);
            match self.save_state(client, &AuthAttemptState::default()).await {
                Ok(()) => {
                    tracing::info!(client = %client, was_locked, "Login attempt state cleared");
                    Ok(was_locked)
                }
                Err(e) => Err(e),
            }
        };
        drop(lock);
        self.release_client_lock(client);
        result
    }

    async fn evaluate_attempt(
        &self,
        client: &ClientKey,
        identifier: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, Error> {
        let mut state = self.load_state(client).await;

        // Credentials are not consulted while locked out, and nothing is written.
        if let Some(remaining_seconds) = state.remaining_lockout_seconds(now) {
            tracing::debug!(client = %client, remaining_seconds, "Login rejected during lockout");
            return Ok(LoginOutcome::LockedOut { remaining_seconds });
        }

        if state.expire_lockout(now) {
            tracing::debug!(client = %client, "Lockout expired, attempt counter reset");
        }

        if self.verifier.verify(identifier, secret).await {
            self.save_state(client, &AuthAttemptState::default()).await?;
            let token = self.sessions.issue(client).await?;
            tracing::info!(client = %client, "Login succeeded");
            return Ok(LoginOutcome::Success(token));
        }

        let outcome = state.record_failure(now, &self.config);
        self.save_state(client, &state).await?;

        match &outcome {
            LoginOutcome::LockedOut { remaining_seconds } => {
                tracing::info!(
                    client = %client,
                    attempts = state.attempts,
                    lockout_seconds = remaining_seconds,
                    "Client locked out after repeated failed logins"
                );
            }
            LoginOutcome::InvalidCredentials { remaining_attempts } => {
                tracing::debug!(client = %client, remaining_attempts, "Invalid credentials");
            }
            LoginOutcome::Success(_) => {}
        }

        Ok(outcome)
    }

    /// Unreadable state is treated as a fresh client.
    async fn load_state(&self, client: &ClientKey) -> AuthAttemptState {
        match self.state_repository.load(client).await {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    client = %client,
                    error = %e,
                    "Failed to load login attempt state, assuming no prior attempts"
                );
                AuthAttemptState::default()
            }
        }
    }

    async fn save_state(&self, client: &ClientKey, state: &AuthAttemptState) -> Result<(), Error> {
        self.state_repository
            .save(client, state)
            .await
            .map_err(|e| {
                tracing::error!(client = %client, error = %e, "Failed to persist login attempt state");
                match e {
                    Error::Storage(StorageError::Persistence(_)) => e,
                    other => Error::Storage(StorageError::Persistence(other.to_string())),
                }
            })
    }

    fn client_lock(&self, client: &ClientKey) -> Arc<Mutex<()>> {
        self.locks.entry(client.clone()).or_default().clone()
    }

    /// Drop the client's lock entry once no other task holds it.
    fn release_client_lock(&self, client: &ClientKey) {
        self.locks
            .remove_if(client, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        SessionToken,
        error::AuthError,
        repositories::memory::{MemoryAuthStateRepository, MemorySessionTokenRepository},
    };
    use async_trait::async_trait;
    use chrono::Duration;

    const EMAIL: &str = "admin@example.com";
    const PASSWORD: &str = "correct horse";

    /// Plain equality check; hashing is covered in the credentials module.
    struct StaticVerifier;

    #[async_trait]
    impl CredentialVerifier for StaticVerifier {
        async fn verify(&self, identifier: &str, secret: &str) -> bool {
            identifier == EMAIL && secret == PASSWORD
        }
    }

    /// Attempt-state repository whose reads or writes can be made to fail.
    #[derive(Default)]
    struct FlakyAuthStateRepository {
        inner: MemoryAuthStateRepository,
        fail_reads: bool,
        fail_writes: bool,
    }

    #[async_trait]
    impl AuthStateRepository for FlakyAuthStateRepository {
        async fn load(&self, client: &ClientKey) -> Result<Option<AuthAttemptState>, Error> {
            if self.fail_reads {
                return Err(Error::Storage(StorageError::Database(
                    "disk I/O error".to_string(),
                )));
            }
            self.inner.load(client).await
        }

        async fn save(&self, client: &ClientKey, state: &AuthAttemptState) -> Result<(), Error> {
            if self.fail_writes {
                return Err(Error::Storage(StorageError::Database(
                    "attempt to write a readonly database".to_string(),
                )));
            }
            // Give concurrent callers a chance to interleave.
            tokio::task::yield_now().await;
            self.inner.save(client, state).await
        }
    }

    /// Token repository that refuses every write.
    struct ReadOnlySessionTokenRepository;

    #[async_trait]
    impl SessionTokenRepository for ReadOnlySessionTokenRepository {
        async fn load(&self, _client: &ClientKey) -> Result<Option<SessionToken>, Error> {
            Ok(None)
        }

        async fn save(&self, _client: &ClientKey, _token: &SessionToken) -> Result<(), Error> {
            Err(Error::Storage(StorageError::Database(
                "attempt to write a readonly database".to_string(),
            )))
        }

        async fn clear(&self, _client: &ClientKey) -> Result<(), Error> {
            Ok(())
        }
    }

    type Guard = LoginGuardService<FlakyAuthStateRepository, MemorySessionTokenRepository>;

    fn guard_with(states: FlakyAuthStateRepository) -> Guard {
        LoginGuardService::new(
            Arc::new(states),
            Arc::new(MemorySessionTokenRepository::default()),
            Arc::new(StaticVerifier),
            LoginGuardConfig::default(),
        )
    }

    fn guard() -> Guard {
        guard_with(FlakyAuthStateRepository::default())
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    async fn stored(guard: &Guard, client: &ClientKey) -> AuthAttemptState {
        guard
            .state_repository
            .load(client)
            .await
            .unwrap()
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_lockout_scenario() {
        let guard = guard();
        let client = ClientKey::default();

        let outcomes = [
            guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap(),
            guard.attempt_login(&client, EMAIL, "wrong", t(1)).await.unwrap(),
            guard.attempt_login(&client, EMAIL, "wrong", t(2)).await.unwrap(),
        ];
        assert_eq!(
            outcomes,
            [
                LoginOutcome::InvalidCredentials { remaining_attempts: 2 },
                LoginOutcome::InvalidCredentials { remaining_attempts: 1 },
                LoginOutcome::LockedOut { remaining_seconds: 180 },
            ]
        );

        // Lockout started at t=2, so 90 seconds remain at t=92, even for the right password.
        let outcome = guard.attempt_login(&client, EMAIL, PASSWORD, t(92)).await.unwrap();
        assert_eq!(outcome, LoginOutcome::LockedOut { remaining_seconds: 90 });
        assert!(!guard.sessions().is_authenticated(&client).await);

        let outcome = guard.attempt_login(&client, EMAIL, PASSWORD, t(182)).await.unwrap();
        let token = outcome.token().cloned().expect("login should succeed after lockout");
        assert_eq!(stored(&guard, &client).await, AuthAttemptState::default());
        assert_eq!(guard.sessions().current(&client).await, Some(token));
    }

    #[tokio::test]
    async fn test_remaining_attempts_drop_by_one() {
        let guard = guard_with(FlakyAuthStateRepository::default());
        let guard = LoginGuardService {
            config: LoginGuardConfig::default().with_max_attempts(5),
            ..guard
        };
        let client = ClientKey::default();

        for (i, expected) in (1..=4).rev().enumerate() {
            let outcome = guard
                .attempt_login(&client, EMAIL, "wrong", t(i as i64))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                LoginOutcome::InvalidCredentials { remaining_attempts: expected }
            );
            assert!(!guard.lockout_status(&client, t(i as i64)).await.is_locked);
        }

        let outcome = guard.attempt_login(&client, EMAIL, "wrong", t(10)).await.unwrap();
        assert_eq!(outcome, LoginOutcome::LockedOut { remaining_seconds: 180 });
    }

    #[tokio::test]
    async fn test_lockout_does_not_consult_credentials_or_write() {
        let guard = guard();
        let client = ClientKey::default();
        for i in 0..3 {
            guard.attempt_login(&client, EMAIL, "wrong", t(i)).await.unwrap();
        }
        let before = stored(&guard, &client).await;

        let mut last = i64::MAX;
        for secs in (3..182).step_by(7) {
            let outcome = guard.attempt_login(&client, EMAIL, PASSWORD, t(secs)).await.unwrap();
            let LoginOutcome::LockedOut { remaining_seconds } = outcome else {
                panic!("expected lockout at t={secs}, got {outcome:?}");
            };
            assert!(remaining_seconds <= last);
            assert!(remaining_seconds > 0);
            last = remaining_seconds;
        }

        assert_eq!(stored(&guard, &client).await, before);
    }

    #[tokio::test]
    async fn test_failure_after_expiry_starts_from_zero() {
        let guard = guard();
        let client = ClientKey::default();
        for i in 0..3 {
            guard.attempt_login(&client, EMAIL, "wrong", t(i)).await.unwrap();
        }

        let outcome = guard.attempt_login(&client, EMAIL, "wrong", t(500)).await.unwrap();
        assert_eq!(outcome, LoginOutcome::InvalidCredentials { remaining_attempts: 2 });
        let state = stored(&guard, &client).await;
        assert_eq!(state.attempts, 1);
        assert_eq!(state.blocked_until, None);
    }

    #[tokio::test]
    async fn test_success_resets_attempts() {
        let guard = guard();
        let client = ClientKey::default();

        guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap();
        guard.attempt_login(&client, EMAIL, "wrong", t(1)).await.unwrap();
        assert_eq!(stored(&guard, &client).await.attempts, 2);

        let outcome = guard.attempt_login(&client, EMAIL, PASSWORD, t(2)).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(stored(&guard, &client).await.attempts, 0);

        // A full set of attempts is available again.
        let outcome = guard.attempt_login(&client, EMAIL, "wrong", t(3)).await.unwrap();
        assert_eq!(outcome, LoginOutcome::InvalidCredentials { remaining_attempts: 2 });
    }

    #[tokio::test]
    async fn test_clients_are_tracked_separately() {
        let guard = guard();
        let locked = ClientKey::new("10.0.0.1").unwrap();
        let other = ClientKey::new("10.0.0.2").unwrap();

        for i in 0..3 {
            guard.attempt_login(&locked, EMAIL, "wrong", t(i)).await.unwrap();
        }

        assert!(guard.lockout_status(&locked, t(3)).await.is_locked);
        let outcome = guard.attempt_login(&other, EMAIL, PASSWORD, t(3)).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced() {
        let guard = guard_with(FlakyAuthStateRepository {
            fail_writes: true,
            ..Default::default()
        });
        let client = ClientKey::default();

        let err = guard
            .attempt_login(&client, EMAIL, "wrong", t(0))
            .await
            .unwrap_err();
        assert!(err.is_persistence_error());

        let err = guard
            .attempt_login(&client, EMAIL, PASSWORD, t(1))
            .await
            .unwrap_err();
        assert!(err.is_persistence_error());
        assert!(!guard.sessions().is_authenticated(&client).await);
    }

    #[tokio::test]
    async fn test_token_write_failure_is_surfaced() {
        let guard = LoginGuardService::new(
            Arc::new(FlakyAuthStateRepository::default()),
            Arc::new(ReadOnlySessionTokenRepository),
            Arc::new(StaticVerifier),
            LoginGuardConfig::default(),
        );
        let client = ClientKey::default();
        guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap();

        let err = guard
            .attempt_login(&client, EMAIL, PASSWORD, t(1))
            .await
            .unwrap_err();

        assert!(err.is_persistence_error());
        assert!(!guard.sessions().is_authenticated(&client).await);
        // The reset was written before the token, so the failure count is already cleared.
        let state = guard.state_repository.load(&client).await.unwrap();
        assert_eq!(state, Some(AuthAttemptState::default()));
    }

    #[tokio::test]
    async fn test_huge_lockout_saturates_instead_of_panicking() {
        let guard = guard_with(FlakyAuthStateRepository::default());
        let guard = LoginGuardService {
            config: LoginGuardConfig {
                max_attempts: 1,
                lockout_duration: Duration::MAX,
            },
            ..guard
        };
        let client = ClientKey::default();

        let outcome = guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::LockedOut { .. }));
        assert!(guard.lockout_status(&client, t(1_000_000)).await.is_locked);
    }

    #[tokio::test]
    async fn test_read_failure_assumes_fresh_state() {
        let guard = guard_with(FlakyAuthStateRepository {
            fail_reads: true,
            ..Default::default()
        });
        let client = ClientKey::default();

        let outcome = guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap();
        assert_eq!(outcome, LoginOutcome::InvalidCredentials { remaining_attempts: 2 });

        let status = guard.lockout_status(&client, t(0)).await;
        assert_eq!(status.failed_attempts, 0);
        assert!(!status.is_locked);
    }

    #[tokio::test]
    async fn test_logout_keeps_attempt_state_and_is_idempotent() {
        let guard = guard();
        let client = ClientKey::default();

        guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap();
        guard.attempt_login(&client, EMAIL, PASSWORD, t(1)).await.unwrap();
        guard.attempt_login(&client, EMAIL, "wrong", t(2)).await.unwrap();
        assert!(guard.sessions().is_authenticated(&client).await);

        guard.logout(&client).await;
        guard.logout(&client).await;

        assert!(!guard.sessions().is_authenticated(&client).await);
        assert_eq!(stored(&guard, &client).await.attempts, 1);
    }

    #[tokio::test]
    async fn test_unlock() {
        let guard = guard();
        let client = ClientKey::default();
        let now = Utc::now();

        for i in 0..3 {
            guard
                .attempt_login(&client, EMAIL, "wrong", now + Duration::seconds(i))
                .await
                .unwrap();
        }

        assert!(guard.unlock(&client).await.unwrap());
        assert!(!guard.unlock(&client).await.unwrap());

        let outcome = guard.login(&client, EMAIL, PASSWORD).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_unlock_at_uses_given_instant() {
        let guard = guard();
        let client = ClientKey::default();
        for i in 0..3 {
            guard.attempt_login(&client, EMAIL, "wrong", t(i)).await.unwrap();
        }

        // Lockout already over at t=500: nothing to lift, but the state is still cleared.
        assert!(!guard.unlock_at(&client, t(500)).await.unwrap());
        assert_eq!(stored(&guard, &client).await, AuthAttemptState::default());

        for i in 0..3 {
            guard.attempt_login(&client, EMAIL, "wrong", t(600 + i)).await.unwrap();
        }
        assert!(guard.unlock_at(&client, t(603)).await.unwrap());
        let outcome = guard.attempt_login(&client, EMAIL, PASSWORD, t(604)).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_into_result_for_rejected_login() {
        let guard = guard();
        let client = ClientKey::default();

        let err = guard
            .attempt_login(&client, EMAIL, "wrong", t(0))
            .await
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials { remaining_attempts: 2 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_are_all_counted() {
        let guard = Arc::new(guard());
        let client = ClientKey::default();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let guard = Arc::clone(&guard);
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                guard.attempt_login(&client, EMAIL, "wrong", t(0)).await.unwrap()
            }));
        }

        let mut locked = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), LoginOutcome::LockedOut { .. }) {
                locked += 1;
            }
        }

        assert_eq!(locked, 1);
        assert_eq!(stored(&guard, &client).await.attempts, 3);
        assert!(guard.lockout_status(&client, t(1)).await.is_locked);
        assert!(guard.locks.is_empty());
    }
}
