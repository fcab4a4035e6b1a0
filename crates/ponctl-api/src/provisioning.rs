// ONU provisioning
//
// The activation sequence: delete any stale registration, add the ONU,
// configure the fixed WAN profiles, enable the LAN port. The whole
// sequence is one unit under the client's retry wrapper, so an illegal
// session halfway through restarts it from the delete.

use std::fmt;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::UnmClient;
use crate::command::{Command, OnuEndpoint, OnuLabel, PonAddress, WAN_PROFILES, WanSelector, WanService};
use crate::deadline::Deadline;
use crate::error::Error;
use crate::transport::Transport;

/// One step of the activation sequence, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    AddOnu,
    SetWanService(WanSelector),
    ActivateLanPort,
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddOnu => f.write_str("add ONU"),
            Self::SetWanService(selector) => write!(f, "set WAN service {selector}"),
            Self::ActivateLanPort => f.write_str("activate LAN port"),
        }
    }
}

/// Raw provisioning input, as read from flags or a TOML file.
///
/// Not validated; turn it into a [`ProvisioningConfig`] before use.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvisioningParams {
    pub olt_ip: String,
    pub pon_slot: u32,
    pub pon_port: u32,
    /// ONU serial, used as its MAC-type identifier.
    pub serial: String,
    pub splitter: String,
    pub splitter_port: String,
    pub client_name: String,
    pub model: String,
    pub vlan: String,
    pub pppoe_user: String,
    pub pppoe_password: String,
}

impl fmt::Debug for ProvisioningParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningParams")
            .field("olt_ip", &self.olt_ip)
            .field("pon_slot", &self.pon_slot)
            .field("pon_port", &self.pon_port)
            .field("serial", &self.serial)
            .field("splitter", &self.splitter)
            .field("splitter_port", &self.splitter_port)
            .field("client_name", &self.client_name)
            .field("model", &self.model)
            .field("vlan", &self.vlan)
            .field("pppoe_user", &self.pppoe_user)
            .field("pppoe_password", &"[REDACTED]")
            .finish()
    }
}

/// Validated, immutable input for [`UnmClient::provision_onu`].
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    onu: OnuEndpoint,
    splitter: String,
    splitter_port: String,
    client_name: String,
    model: String,
    vlan: String,
    pppoe_user: String,
    pppoe_password: SecretString,
}

impl ProvisioningConfig {
    /// Validate `params`. Missing OLT address, serial, model, VLAN or
    /// PPPoE credentials is an [`Error::Config`].
    pub fn new(params: ProvisioningParams) -> Result<Self, Error> {
        require("olt_ip", &params.olt_ip)?;
        require("serial", &params.serial)?;
        require("model", &params.model)?;
        require("vlan", &params.vlan)?;
        require("pppoe_user", &params.pppoe_user)?;
        require("pppoe_password", &params.pppoe_password)?;

        Ok(Self {
            onu: OnuEndpoint::new(
                PonAddress::new(params.olt_ip, params.pon_slot, params.pon_port),
                params.serial,
            ),
            splitter: params.splitter,
            splitter_port: params.splitter_port,
            client_name: params.client_name,
            model: params.model,
            vlan: params.vlan,
            pppoe_user: params.pppoe_user,
            pppoe_password: SecretString::from(params.pppoe_password),
        })
    }

    pub fn onu(&self) -> &OnuEndpoint {
        &self.onu
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn vlan(&self) -> &str {
        &self.vlan
    }

    pub fn pppoe_user(&self) -> &str {
        &self.pppoe_user
    }

    fn label(&self) -> OnuLabel<'_> {
        OnuLabel {
            client_name: &self.client_name,
            splitter: &self.splitter,
            splitter_port: &self.splitter_port,
            model: &self.model,
        }
    }

    fn wan_service(&self, selector: WanSelector) -> WanService<'_> {
        WanService {
            vlan: &self.vlan,
            pppoe_user: &self.pppoe_user,
            pppoe_password: &self.pppoe_password,
            selector,
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Config {
            field,
            reason: "is required".into(),
        });
    }
    Ok(())
}

fn step_failed(step: ProvisioningStep) -> impl FnOnce(Error) -> Error {
    move |source| Error::Step {
        step,
        source: Box::new(source),
    }
}

impl<T: Transport> UnmClient<T> {
    /// Run the full activation sequence for one ONU.
    ///
    /// A failing delete is logged and ignored: the ONU usually does not
    /// exist yet. Any later failure aborts and names its step.
    pub async fn provision_onu(
        &self,
        deadline: &Deadline,
        config: &ProvisioningConfig,
    ) -> Result<(), Error> {
        self.execute_with_retry(deadline, move || self.run_provisioning(deadline, config))
            .await?;

        info!(
            olt = %config.onu.pon.olt,
            slot = config.onu.pon.slot,
            port = config.onu.pon.port,
            serial = %config.onu.mac,
            client = %config.client_name,
            "ONU provisioned"
        );
        Ok(())
    }

    async fn run_provisioning(
        &self,
        deadline: &Deadline,
        config: &ProvisioningConfig,
    ) -> Result<(), Error> {
        let onu = &config.onu;

        // Cannot tell "not found" from other rejections here.
        if let Err(e) = self.send_command(deadline, Command::DeleteOnu { onu }).await {
            warn!(serial = %onu.mac, error = %e, "deleting existing ONU failed, continuing");
        }

        self.send_command(
            deadline,
            Command::AddOnu {
                onu,
                label: config.label(),
            },
        )
        .await
        .map_err(step_failed(ProvisioningStep::AddOnu))?;
        debug!(serial = %onu.mac, "ONU added");

        for selector in WAN_PROFILES {
            self.send_command(
                deadline,
                Command::SetWanService {
                    onu,
                    service: config.wan_service(selector),
                },
            )
            .await
            .map_err(step_failed(ProvisioningStep::SetWanService(selector)))?;
            debug!(serial = %onu.mac, %selector, "WAN service configured");
        }

        self.send_command(deadline, Command::ActivateLanPort { onu })
            .await
            .map_err(step_failed(ProvisioningStep::ActivateLanPort))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params() -> ProvisioningParams {
        ProvisioningParams {
            olt_ip: "OLT1".into(),
            pon_slot: 1,
            pon_port: 2,
            serial: "AABBCC".into(),
            model: "X".into(),
            vlan: "100".into(),
            pppoe_user: "u".into(),
            pppoe_password: "p".into(),
            ..ProvisioningParams::default()
        }
    }

    #[test]
    fn complete_params_validate() {
        let config = ProvisioningConfig::new(params()).unwrap();
        assert_eq!(config.onu().pon.to_string(), "OLTID=OLT1,PONID=NA-NA-1-2");
        assert_eq!(config.onu().mac, "AABBCC");
    }

    #[test]
    fn each_required_field_is_enforced() {
        let blankers: [(&str, fn(&mut ProvisioningParams)); 6] = [
            ("olt_ip", |p| p.olt_ip.clear()),
            ("serial", |p| p.serial.clear()),
            ("model", |p| p.model.clear()),
            ("vlan", |p| p.vlan = "  ".into()),
            ("pppoe_user", |p| p.pppoe_user.clear()),
            ("pppoe_password", |p| p.pppoe_password.clear()),
        ];

        for (expected, blank) in blankers {
            let mut p = params();
            blank(&mut p);
            let err = ProvisioningConfig::new(p).unwrap_err();
            assert!(
                matches!(err, Error::Config { field, .. } if field == expected),
                "{expected}: {err}"
            );
        }
    }

    #[test]
    fn debug_redacts_pppoe_password() {
        let rendered = format!("{:?}", params());
        assert!(!rendered.contains("\"p\""));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn step_labels() {
        assert_eq!(
            ProvisioningStep::SetWanService(WanSelector::Uport(3)).to_string(),
            "set WAN service UPORT=3"
        );
        assert_eq!(ProvisioningStep::ActivateLanPort.to_string(), "activate LAN port");
    }
}
