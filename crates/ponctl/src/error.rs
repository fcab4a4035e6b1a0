//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ponctl_config::ConfigError;
use ponctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to UNM at {address}")]
    #[diagnostic(
        code(ponctl::connection_failed),
        help(
            "Check that the UNM server is running and its TL1 port is reachable.\n\
             Address: {address}\n\
             Try: ponctl ping --host <host> --port <port>"
        )
    )]
    ConnectionFailed {
        address: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Connection to UNM was lost: {reason}")]
    #[diagnostic(code(ponctl::disconnected))]
    Disconnected { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("UNM rejected the session after {attempts} attempts")]
    #[diagnostic(
        code(ponctl::session_rejected),
        help(
            "Last server message: {message}\n\
             Verify the username and password for this profile."
        )
    )]
    SessionRejected { attempts: u32, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(ponctl::no_credentials),
        help(
            "Set username/password in the profile, or export PONCTL_USERNAME\n\
             and PONCTL_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(ponctl::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── UNM ──────────────────────────────────────────────────────────

    #[error("UNM rejected the command: {message}")]
    #[diagnostic(code(ponctl::rejected))]
    Rejected { message: String },

    #[error("Provisioning stopped at '{step}': {message}")]
    #[diagnostic(
        code(ponctl::provisioning_failed),
        help("Steps before '{step}' were applied; rerunning provisioning starts over from the ONU delete.")
    )]
    ProvisioningFailed { step: String, message: String },

    #[error("Unexpected response from UNM: {message}")]
    #[diagnostic(code(ponctl::protocol))]
    Protocol { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ponctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ponctl::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No UNM server configured")]
    #[diagnostic(
        code(ponctl::no_config),
        help(
            "Pass --host, set PONCTL_HOST, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ponctl::config))]
    Config(Box<figment::Error>),

    #[error("Invalid file {path}: {reason}")]
    #[diagnostic(code(ponctl::invalid_file))]
    InvalidFile { path: String, reason: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Operation cancelled: {reason}")]
    #[diagnostic(
        code(ponctl::timeout),
        help("Increase the timeout with --timeout or check UNM responsiveness.")
    )]
    Timeout { reason: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(ponctl::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected { .. } => exit_code::CONNECTION,
            Self::SessionRejected { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } | Self::ProvisioningFailed { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { address, reason } => CliError::ConnectionFailed {
                address,
                source: reason.into(),
            },
            CoreError::Disconnected { reason } => CliError::Disconnected { reason },
            CoreError::Cancelled { reason } => CliError::Timeout { reason },
            CoreError::SessionRejected { attempts, message } => {
                CliError::SessionRejected { attempts, message }
            }
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::Protocol { message } => CliError::Protocol { message },
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::ProvisioningFailed { step, message } => {
                CliError::ProvisioningFailed { step, message }
            }
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::InvalidFile {
                path: "connections".into(),
                reason: message,
            },
        }
    }
}

impl From<ponctl_api::Error> for CliError {
    fn from(err: ponctl_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Figment(inner) => CliError::Config(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_failure_keeps_step_and_exit_code() {
        let err: CliError = CoreError::ProvisioningFailed {
            step: "set WAN service UPORT=3".into(),
            message: "VLAN not exist".into(),
        }
        .into();

        assert_eq!(err.exit_code(), exit_code::REJECTED);
        assert_eq!(
            err.to_string(),
            "Provisioning stopped at 'set WAN service UPORT=3': VLAN not exist"
        );
    }

    #[test]
    fn api_errors_route_through_core() {
        let err: CliError = ponctl_api::Error::Connect {
            address: "10.0.0.1:3337".into(),
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONNECTION);

        let err: CliError = ponctl_api::Error::Cancelled {
            cause: ponctl_api::CancelCause::DeadlineExceeded,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn missing_credentials_exit_with_auth_code() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "lab".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
