// ponctl-core: Provisioning workflows on top of ponctl-api.

pub mod connection;
pub mod error;
pub mod model;
pub mod service;

// ── Primary re-exports ──────────────────────────────────────────────
pub use connection::{ConnectionRepository, InMemoryRepository};
pub use error::CoreError;
pub use model::{ConnectionInfo, OnuSignal, ProvisioningOutcome};
pub use service::{DEFAULT_ONU_MODEL, ProvisioningService};
