use std::fmt;

use thiserror::Error;

use crate::provisioning::ProvisioningStep;

/// Top-level error type for the `ponctl-api` crate.
///
/// Covers every failure mode of a UNM session: bad construction input,
/// the TCP transport, malformed payloads, device-side rejections and
/// caller cancellation. `ponctl-core` maps these into domain categories.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Invalid construction input (empty host, zero port, missing field).
    #[error("Invalid configuration: {field}: {reason}")]
    Config { field: &'static str, reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Dialing the UNM server failed or timed out.
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The transport was closed or never opened.
    #[error("Not connected to server")]
    NotConnected,

    /// The peer closed the socket while a command was in flight.
    #[error("Connection lost while {during}")]
    ConnectionLost { during: &'static str },

    /// Socket read/write failure.
    #[error("Socket {during} failed: {source}")]
    Io {
        during: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// An empty command was handed to the transport.
    #[error("Command cannot be empty")]
    EmptyCommand,

    // ── Wire payload ────────────────────────────────────────────────
    /// The server answered with nothing at all.
    #[error("Invalid response format: empty response")]
    InvalidResponse,

    /// The response envelope is too short for the expected shape.
    #[error("Invalid response format: {0}")]
    Format(#[from] FormatError),

    // ── Server-side rejections ──────────────────────────────────────
    /// The device rejected the command (`EADD=<message>`).
    #[error("UNM server error: {message}")]
    Server { message: String },

    /// The current session is no longer valid and must be re-established.
    #[error("UNM server error: {message}")]
    IllegalSession { message: String },

    // ── Orchestration ───────────────────────────────────────────────
    /// A provisioning step failed.
    #[error("{step} failed: {source}")]
    Step {
        step: ProvisioningStep,
        #[source]
        source: Box<Error>,
    },

    /// The retry budget was exhausted; wraps the last failure.
    #[error("Maximum retry attempts exceeded ({attempts}): {last}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },

    // ── Caller control ──────────────────────────────────────────────
    /// The caller's deadline or cancellation fired first.
    #[error("Command cancelled: {cause}")]
    Cancelled { cause: CancelCause },
}

/// Malformed or undersized response bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("insufficient data in response: {found} lines, need more than {required}")]
    InsufficientData { found: usize, required: usize },

    #[error("expected {expected} columns, got {found}")]
    MissingColumns { expected: usize, found: usize },
}

/// Why a call was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    DeadlineExceeded,
    Cancelled,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Cancelled => f.write_str("context canceled"),
        }
    }
}

const ILLEGAL_SESSION_MARKER: &str = "illegal session";

impl Error {
    /// Classify an `EADD=` message from the server.
    pub(crate) fn from_server_message(message: String) -> Self {
        if message.to_lowercase().contains(ILLEGAL_SESSION_MARKER) {
            Self::IllegalSession { message }
        } else {
            Self::Server { message }
        }
    }

    /// Returns `true` if this error (or the step error it wraps) means the
    /// session was invalidated and re-authentication might resolve it.
    pub fn is_illegal_session(&self) -> bool {
        match self {
            Self::IllegalSession { .. } => true,
            Self::Step { source, .. } => source.is_illegal_session(),
            _ => false,
        }
    }

    /// Returns `true` if the caller's deadline or cancellation fired.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Step { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Returns `true` for socket-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::NotConnected | Self::ConnectionLost { .. } | Self::Io { .. }
        )
    }

    /// The server's message, if this is a device-side rejection.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message } | Self::IllegalSession { message } => Some(message),
            Self::Step { source, .. } => source.server_message(),
            _ => None,
        }
    }
}
