//! Shared configuration for the ponctl CLI.
//!
//! TOML profiles, credential resolution (env + plaintext), and
//! translation to `ponctl_api::ClientConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ponctl_api::{ClientConfig, DEFAULT_UNM_PORT, TransportConfig};

/// Environment variable consulted for the UNM password.
pub const PASSWORD_ENV: &str = "PONCTL_PASSWORD";
/// Environment variable consulted for the UNM username.
pub const USERNAME_ENV: &str = "PONCTL_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named UNM server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// ONU model used when provisioning does not name one.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            model: default_model(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_model() -> String {
    "AN5506-01-A1".into()
}

/// A named UNM server profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// UNM server hostname or IP.
    pub host: String,

    /// TL1 port.
    #[serde(default = "default_port")]
    pub port: u16,

    pub username: Option<String>,

    /// Password in plaintext. Prefer `password_env`.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Per-command timeout in seconds.
    pub timeout: Option<u64>,

    /// Dial timeout in seconds.
    pub connect_timeout: Option<u64>,

    /// Override the default ONU model.
    pub model: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_UNM_PORT
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "ponctl", "ponctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ponctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` (missing file is fine) layered under
/// `PONCTL_`-prefixed env vars, `__` separating nested keys.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PONCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the password: `password_env` → `PONCTL_PASSWORD` → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve username + password without CLI flags.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    let password = resolve_password(profile, profile_name)?;
    Ok((username, password))
}

/// Build a `ClientConfig` from a profile, without CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ClientConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let (username, password) = resolve_credentials(profile, profile_name)?;

    let mut transport = TransportConfig::new(profile.host.clone(), profile.port);
    if let Some(secs) = profile.connect_timeout {
        transport = transport.with_connect_timeout(Duration::from_secs(secs));
    }

    Ok(ClientConfig {
        transport,
        username,
        password,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
    })
}
