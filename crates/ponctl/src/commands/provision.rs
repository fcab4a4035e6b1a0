//! `provision`: run the ONU activation sequence from explicit parameters.

use std::path::Path;

use serde::Serialize;

use ponctl_api::{ProvisioningConfig, ProvisioningParams};

use crate::cli::{GlobalOpts, ProvisionArgs};
use crate::commands::CommandContext;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ProvisionReport {
    olt: String,
    slot: u32,
    port: u32,
    serial: String,
    client_name: String,
    model: String,
    vlan: String,
}

impl From<&ProvisioningConfig> for ProvisionReport {
    fn from(config: &ProvisioningConfig) -> Self {
        let onu = config.onu();
        Self {
            olt: onu.pon.olt.clone(),
            slot: onu.pon.slot,
            port: onu.pon.port,
            serial: onu.mac.clone(),
            client_name: config.client_name().to_owned(),
            model: config.model().to_owned(),
            vlan: config.vlan().to_owned(),
        }
    }
}

fn detail(r: &ProvisionReport) -> String {
    output::detail_block(&[
        ("Status", "provisioned".into()),
        ("OLT", r.olt.clone()),
        ("PON", format!("{}/{}", r.slot, r.port)),
        ("Serial", r.serial.clone()),
        ("Client", r.client_name.clone()),
        ("Model", r.model.clone()),
        ("VLAN", r.vlan.clone()),
    ])
}

fn read_params(path: &Path) -> Result<ProvisioningParams, CliError> {
    let invalid = |reason: String| CliError::InvalidFile {
        path: path.display().to_string(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    toml::from_str(&contents).map_err(|e| invalid(e.to_string()))
}

/// File values first, flags on top, then the profile's model if none was given.
fn build_params(args: ProvisionArgs, default_model: &str) -> Result<ProvisioningParams, CliError> {
    let mut params = match args.file.as_deref() {
        Some(path) => read_params(path)?,
        None => ProvisioningParams::default(),
    };

    let overrides = [
        (args.olt, &mut params.olt_ip),
        (args.serial, &mut params.serial),
        (args.splitter, &mut params.splitter),
        (args.splitter_port, &mut params.splitter_port),
        (args.client_name, &mut params.client_name),
        (args.model, &mut params.model),
        (args.vlan, &mut params.vlan),
        (args.pppoe_user, &mut params.pppoe_user),
        (args.pppoe_password, &mut params.pppoe_password),
    ];
    for (flag, field) in overrides {
        if let Some(value) = flag {
            *field = value;
        }
    }
    if let Some(slot) = args.pon_slot {
        params.pon_slot = slot;
    }
    if let Some(port) = args.pon_port {
        params.pon_port = port;
    }
    if params.model.trim().is_empty() {
        default_model.clone_into(&mut params.model);
    }

    Ok(params)
}

pub async fn handle(
    ctx: &CommandContext,
    args: ProvisionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = build_params(args, &ctx.settings.model)?;
    let config = ProvisioningConfig::new(params)?;

    let client = ctx.connect().await?;
    let result = client.provision_onu(&ctx.deadline(), &config).await;
    ctx.close(&client).await;
    result?;

    let report = ProvisionReport::from(&config);
    let out = output::render_single(&global.output, &report, detail, |r| r.serial.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
