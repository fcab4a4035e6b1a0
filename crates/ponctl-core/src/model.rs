// Domain records for the provisioning workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Everything the field operations team recorded about one service
/// assignment, keyed by its protocol number.
///
/// OLT slot and port arrive as free text from the assignment system and
/// are parsed at provisioning time.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionInfo {
    /// Protocol (assignment) number used to look the record up.
    pub assignment_id: u64,
    pub assignment_title: String,
    pub olt_ip: String,
    pub olt_slot: String,
    pub olt_port: String,
    pub serial: String,
    pub client_ip: String,
    pub splitter_name: String,
    pub splitter_port: String,
    pub pppoe_username: String,
    #[serde(skip_serializing)]
    pub pppoe_password: String,
    pub vlan: String,
    pub contract_description: String,
    pub client_name: String,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("assignment_id", &self.assignment_id)
            .field("olt_ip", &self.olt_ip)
            .field("olt_slot", &self.olt_slot)
            .field("olt_port", &self.olt_port)
            .field("serial", &self.serial)
            .field("client_name", &self.client_name)
            .field("vlan", &self.vlan)
            .field("pppoe_username", &self.pppoe_username)
            .field("pppoe_password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Optical power read right after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnuSignal {
    pub tx_power: String,
    pub rx_power: String,
}

/// Result of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningOutcome {
    pub protocol: u64,
    pub serial: String,
    pub client_name: String,
    /// `None` when the ONU was provisioned but its optics could not be read.
    pub signal: Option<OnuSignal>,
}
