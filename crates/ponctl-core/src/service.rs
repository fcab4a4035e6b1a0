// ── Provisioning service ──
//
// Turns a protocol number into a provisioned ONU: look up the assignment,
// validate and normalize it, run the UNM activation sequence, then read
// back the optical levels so the technician on site gets immediate
// feedback.

use std::sync::Arc;

use ponctl_api::{
    Deadline, OnuEndpoint, ProvisioningConfig, ProvisioningParams, TcpTransport,
    Transport, UnmClient,
};
use tracing::{info, warn};

use crate::connection::ConnectionRepository;
use crate::error::CoreError;
use crate::model::{ConnectionInfo, OnuSignal, ProvisioningOutcome};

/// ONU hardware model assumed when the assignment does not name one.
pub const DEFAULT_ONU_MODEL: &str = "AN5506-01-A1";

/// Provisioning workflow over a shared UNM client.
pub struct ProvisioningService<R, T = TcpTransport> {
    client: Arc<UnmClient<T>>,
    repository: R,
    model: String,
}

impl<R: ConnectionRepository, T: Transport> ProvisioningService<R, T> {
    pub fn new(client: Arc<UnmClient<T>>, repository: R) -> Self {
        Self {
            client,
            repository,
            model: DEFAULT_ONU_MODEL.to_owned(),
        }
    }

    /// Override the ONU model sent with `ADD-ONU`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn client(&self) -> &Arc<UnmClient<T>> {
        &self.client
    }

    /// Look up `protocol` and provision the ONU it describes.
    pub async fn provision(
        &self,
        deadline: &Deadline,
        protocol: u64,
    ) -> Result<ProvisioningOutcome, CoreError> {
        let info = self
            .repository
            .connection_info(protocol)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "Connection".into(),
                identifier: protocol.to_string(),
            })?;

        self.provision_connection(deadline, &info).await
    }

    /// Provision the ONU described by an already-resolved record.
    pub async fn provision_connection(
        &self,
        deadline: &Deadline,
        info: &ConnectionInfo,
    ) -> Result<ProvisioningOutcome, CoreError> {
        let config = self.provisioning_config(info)?;

        info!(
            olt = %info.olt_ip,
            serial = %info.serial,
            client = %info.client_name,
            protocol = info.assignment_id,
            "starting ONU provisioning"
        );
        self.client.provision_onu(deadline, &config).await?;

        let signal = match self.read_signal(deadline, config.onu()).await {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!(serial = %info.serial, error = %e, "could not read ONU signal after provisioning");
                None
            }
        };

        Ok(ProvisioningOutcome {
            protocol: info.assignment_id,
            serial: info.serial.clone(),
            client_name: info.client_name.clone(),
            signal,
        })
    }

    async fn read_signal(
        &self,
        deadline: &Deadline,
        onu: &OnuEndpoint,
    ) -> Result<OnuSignal, ponctl_api::Error> {
        let optical = self.client.optical_info(deadline, onu).await?;
        Ok(OnuSignal {
            tx_power: optical.tx_power,
            rx_power: optical.rx_power,
        })
    }

    fn provisioning_config(&self, info: &ConnectionInfo) -> Result<ProvisioningConfig, CoreError> {
        validate(info)?;
        let (slot, port) = parse_slot_port(&info.olt_slot, &info.olt_port)?;

        ProvisioningConfig::new(ProvisioningParams {
            olt_ip: info.olt_ip.clone(),
            pon_slot: slot,
            pon_port: port,
            serial: info.serial.clone(),
            splitter: info.splitter_name.clone(),
            splitter_port: info.splitter_port.clone(),
            client_name: info.client_name.clone(),
            model: self.model.clone(),
            vlan: info.vlan.clone(),
            pppoe_user: info.pppoe_username.clone(),
            pppoe_password: info.pppoe_password.clone(),
        })
        .map_err(CoreError::from)
    }
}

fn validate(info: &ConnectionInfo) -> Result<(), CoreError> {
    let required = [
        ("OLT IP", &info.olt_ip),
        ("equipment serial number", &info.serial),
        ("PPPoE username", &info.pppoe_username),
        ("PPPoE password", &info.pppoe_password),
        ("VLAN", &info.vlan),
    ];
    for (what, value) in required {
        if value.trim().is_empty() {
            return Err(CoreError::validation(format!("{what} is required")));
        }
    }
    Ok(())
}

/// Parse free-text slot and port as unsigned integers, ignoring padding.
pub fn parse_slot_port(slot: &str, port: &str) -> Result<(u32, u32), CoreError> {
    let slot = slot
        .trim()
        .parse::<u32>()
        .map_err(|e| CoreError::validation(format!("invalid OLT slot '{slot}': {e}")))?;
    let port = port
        .trim()
        .parse::<u32>()
        .map_err(|e| CoreError::validation(format!("invalid OLT port '{port}': {e}")))?;
    Ok((slot, port))
}
