//! Runtime settings for the `inkpost` binary and embedding applications.
//!
//! Settings are read, in increasing priority, from built-in defaults, an optional
//! `inkpost.toml` and `INKPOST__`-prefixed environment variables, with `__`
//! separating nested keys:
//!
//! - `INKPOST__DATABASE_URL=sqlite://inkpost.db`
//! - `INKPOST__ADMIN__EMAIL=admin@example.com`
//! - `INKPOST__ADMIN__PASSWORD_HASH='$argon2id$v=19$...'`
//! - `INKPOST__GUARD__MAX_ATTEMPTS=3`
//! - `INKPOST__GUARD__LOCKOUT_SECONDS=180`
//!
//! The admin password is only ever configured as an Argon2 hash; produce one with
//! `inkpost hash-password`.

use chrono::Duration;
use config::{Config, ConfigError, Environment, File, FileFormat};
use inkpost_core::{
    AdminCredentials, LoginGuardConfig,
    error::{ValidationError, utilities::RequiredFieldExt},
    guard::{DEFAULT_LOCKOUT_SECONDS, DEFAULT_MAX_ATTEMPTS},
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "inkpost.toml";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://inkpost.db";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub guard: GuardSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSettings {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_lockout_seconds")]
    pub lockout_seconds: i64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_lockout_seconds() -> i64 {
    DEFAULT_LOCKOUT_SECONDS
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_seconds: DEFAULT_LOCKOUT_SECONDS,
        }
    }
}

impl Settings {
    /// Load settings from `.env`, `inkpost.toml` (if present) and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Like [`load`](Self::load) with an explicit settings file path.
    pub fn load_from(path: &str) -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        let config = base_builder()?
            .add_source(File::with_name(path).required(false))
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse settings from a TOML string, ignoring the environment.
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        let config = base_builder()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// The configured lockout policy, validated.
    pub fn guard_config(&self) -> Result<LoginGuardConfig, SettingsError> {
        let lockout = Duration::try_seconds(self.guard.lockout_seconds).ok_or_else(|| {
            ValidationError::InvalidConfig(format!(
                "lockout_seconds out of range: {}",
                self.guard.lockout_seconds
            ))
        })?;
        Ok(LoginGuardConfig::new(self.guard.max_attempts, lockout)?)
    }

    /// The administrator account. Both the email and the password hash must be set.
    pub fn admin_credentials(&self) -> Result<AdminCredentials, SettingsError> {
        let email = self.admin.email.as_deref().require_field("Admin email")?;
        let hash = self
            .admin
            .password_hash
            .as_deref()
            .require_field("Admin password hash")?;
        Ok(AdminCredentials::new(email, hash)?)
    }
}

fn base_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("guard.max_attempts", i64::from(DEFAULT_MAX_ATTEMPTS))?
        .set_default("guard.lockout_seconds", DEFAULT_LOCKOUT_SECONDS)
}

fn environment() -> Environment {
    Environment::with_prefix("INKPOST")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
