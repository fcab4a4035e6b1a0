// ── Runtime connection configuration ──
//
// Describes *how* to reach and authenticate with a UNM server. Carries
// credentials and connection tuning, never touches disk: `ponctl-config`
// builds one of these from a profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use crate::transport::TransportConfig;

/// Default TL1 port of the UNM management server.
pub const DEFAULT_UNM_PORT: u16 = 3337;

/// Everything needed to open an authenticated UNM session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub username: String,
    pub password: SecretString,
    /// Default per-operation deadline for callers that do not bring one.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            transport: TransportConfig::new(host, DEFAULT_UNM_PORT),
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.transport.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
