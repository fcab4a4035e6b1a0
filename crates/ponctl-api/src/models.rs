// UNM response records
//
// Plain rows decoded from the tab-separated bodies of LST-ONU and
// LST-OMDDM. Values are kept as the strings the server sent; the UNM
// formats numbers with units and locale quirks that are not worth
// second-guessing here.

use serde::{Deserialize, Serialize};

/// One ONU row from `LST-ONU`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnuSummary {
    pub olt_id: String,
    pub pon_id: String,
    /// ONU index on the PON port.
    pub onu_no: String,
    pub name: String,
    pub description: String,
    pub onu_type: String,
    pub ip: String,
    pub auth_type: String,
    pub mac: String,
    /// Logical ONU identifier (LOID).
    pub loid: String,
    pub password: String,
    pub software_version: String,
}

/// Optical measurements for one ONU from `LST-OMDDM`.
///
/// A point-in-time reading; every value is paired with the status flag
/// the server reports for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpticalInfo {
    pub onu_id: String,
    pub rx_power: String,
    pub rx_power_status: String,
    pub tx_power: String,
    pub tx_power_status: String,
    pub tx_bias: String,
    pub tx_bias_status: String,
    pub temperature: String,
    pub temperature_status: String,
    pub voltage: String,
    pub voltage_status: String,
    /// Tx power measured at the OLT side.
    pub peer_tx_power: String,
    /// Rx power measured at the OLT side.
    pub peer_rx_power: String,
}
