// ── Connection lookup ──
//
// Resolves a protocol number to the ConnectionInfo recorded for it. The
// production source is an external assignment database; ponctl ships an
// in-memory repository that can be seeded from a TOML file.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::CoreError;
use crate::model::ConnectionInfo;

/// Source of connection records.
pub trait ConnectionRepository: Send + Sync {
    /// The record for `protocol`, or `None` when no such assignment exists.
    fn connection_info(
        &self,
        protocol: u64,
    ) -> impl Future<Output = Result<Option<ConnectionInfo>, CoreError>> + Send;
}

/// Connection records held in memory, keyed by assignment id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    connections: HashMap<u64, ConnectionInfo>,
}

#[derive(Deserialize)]
struct ConnectionsFile {
    #[serde(default)]
    connections: Vec<ConnectionInfo>,
}

impl InMemoryRepository {
    pub fn new(connections: impl IntoIterator<Item = ConnectionInfo>) -> Self {
        Self {
            connections: connections
                .into_iter()
                .map(|info| (info.assignment_id, info))
                .collect(),
        }
    }

    /// Parse a `[[connections]]` TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let file: ConnectionsFile = toml::from_str(contents).map_err(|e| CoreError::Config {
            message: format!("invalid connections file: {e}"),
        })?;
        Ok(Self::new(file.connections))
    }

    /// Read and parse a connections file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CoreError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let repo = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), count = repo.len(), "loaded connections");
        Ok(repo)
    }

    pub fn insert(&mut self, info: ConnectionInfo) {
        self.connections.insert(info.assignment_id, info);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl ConnectionRepository for InMemoryRepository {
    async fn connection_info(&self, protocol: u64) -> Result<Option<ConnectionInfo>, CoreError> {
        Ok(self.connections.get(&protocol).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    const CONNECTIONS: &str = r#"
[[connections]]
assignment_id = 4821
olt_ip = "10.20.0.2"
olt_slot = " 11 "
olt_port = "3"
serial = "FHTT1234ABCD"
pppoe_username = "maria.silva"
pppoe_password = "s3cret"
vlan = "1200"
client_name = "Maria Silva"

[[connections]]
assignment_id = 4822
olt_ip = "10.20.0.3"
"#;

    #[test]
    fn parses_connections_by_assignment_id() {
        let repo = InMemoryRepository::from_toml_str(CONNECTIONS).unwrap();
        assert_eq!(repo.len(), 2);

        let info = tokio_test::block_on(repo.connection_info(4821)).unwrap().unwrap();
        assert_eq!(info.serial, "FHTT1234ABCD");
        assert_eq!(info.olt_slot, " 11 ");
        assert_eq!(info.splitter_name, "");

        assert!(tokio_test::block_on(repo.connection_info(1)).unwrap().is_none());
    }

    #[test]
    fn load_reads_file_and_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONNECTIONS.as_bytes()).unwrap();
        assert_eq!(InMemoryRepository::load(file.path()).unwrap().len(), 2);

        let err = InMemoryRepository::from_toml_str("connections = 3").unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn debug_hides_pppoe_password() {
        let repo = InMemoryRepository::from_toml_str(CONNECTIONS).unwrap();
        let info = tokio_test::block_on(repo.connection_info(4821)).unwrap().unwrap();
        assert!(!format!("{info:?}").contains("s3cret"));
    }
}
