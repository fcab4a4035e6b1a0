// ponctl-api: Async Rust client for TL1 OLT management servers (UNM)

pub mod client;
pub mod command;
pub mod config;
pub mod deadline;
pub mod decode;
pub mod error;
pub mod models;
mod onu;
pub mod provisioning;
mod session;
pub mod transport;

pub use client::{MAX_RETRY_ATTEMPTS, UnmClient};
pub use command::{OnuEndpoint, PonAddress, WAN_PROFILES, WanSelector};
pub use config::{ClientConfig, DEFAULT_UNM_PORT};
pub use deadline::Deadline;
pub use error::{CancelCause, Error, FormatError};
pub use models::{OnuSummary, OpticalInfo};
pub use provisioning::{ProvisioningConfig, ProvisioningParams, ProvisioningStep};
pub use transport::{TcpTransport, Transport, TransportConfig};
