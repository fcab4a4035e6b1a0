// ── Core error types ──
//
// User-facing errors from ponctl-core. These are NOT wire-specific --
// consumers never see raw EADD lines or socket errors directly.
// The `From<ponctl_api::Error>` impl translates protocol-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to UNM at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("UNM connection lost: {reason}")]
    Disconnected { reason: String },

    #[error("Operation cancelled: {reason}")]
    Cancelled { reason: String },

    // ── Session errors ───────────────────────────────────────────────
    #[error("UNM session could not be established after {attempts} attempts: {message}")]
    SessionRejected { attempts: u32, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Unexpected response from UNM: {message}")]
    Protocol { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by UNM: {message}")]
    Rejected { message: String },

    #[error("Provisioning failed at step '{step}': {message}")]
    ProvisioningFailed { step: String, message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from protocol-layer errors ────────────────────────────

impl From<ponctl_api::Error> for CoreError {
    fn from(err: ponctl_api::Error) -> Self {
        use ponctl_api::Error as Api;

        match err {
            Api::Config { field, reason } => CoreError::ValidationFailed {
                message: format!("{field} {reason}"),
            },
            Api::Connect { address, reason } => CoreError::ConnectionFailed { address, reason },
            e @ (Api::NotConnected | Api::ConnectionLost { .. } | Api::Io { .. }) => {
                CoreError::Disconnected {
                    reason: e.to_string(),
                }
            }
            e @ (Api::EmptyCommand | Api::InvalidResponse | Api::Format(_)) => {
                CoreError::Protocol {
                    message: e.to_string(),
                }
            }
            Api::Server { message } | Api::IllegalSession { message } => {
                CoreError::Rejected { message }
            }
            Api::Step { step, source } => CoreError::ProvisioningFailed {
                step: step.to_string(),
                message: CoreError::from(*source).to_string(),
            },
            Api::MaxRetriesExceeded { attempts, last } => CoreError::SessionRejected {
                attempts,
                message: last.to_string(),
            },
            Api::Cancelled { cause } => CoreError::Cancelled {
                reason: cause.to_string(),
            },
        }
    }
}
