//! ONU inspection: list a PON port, read optical levels.

use tabled::Tabled;

use ponctl_api::{OnuEndpoint, OnuSummary, OpticalInfo, PonAddress};

use crate::cli::{GlobalOpts, OnusArgs, OnusCommand};
use crate::commands::CommandContext;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct OnuRow {
    #[tabled(rename = "No")]
    onu_no: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    onu_type: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn onu_row(o: &OnuSummary) -> OnuRow {
    OnuRow {
        onu_no: o.onu_no.clone(),
        name: o.name.clone(),
        onu_type: o.onu_type.clone(),
        mac: o.mac.clone(),
        ip: o.ip.clone(),
        description: o.description.clone(),
    }
}

fn optical_detail(o: &OpticalInfo) -> String {
    output::detail_block(&[
        ("ONU", o.onu_id.clone()),
        ("Rx power", format!("{} ({})", o.rx_power, o.rx_power_status)),
        ("Tx power", format!("{} ({})", o.tx_power, o.tx_power_status)),
        ("Tx bias", format!("{} ({})", o.tx_bias, o.tx_bias_status)),
        ("Temperature", format!("{} ({})", o.temperature, o.temperature_status)),
        ("Voltage", format!("{} ({})", o.voltage, o.voltage_status)),
        ("OLT Tx power", o.peer_tx_power.clone()),
        ("OLT Rx power", o.peer_rx_power.clone()),
    ])
}

pub async fn handle(ctx: &CommandContext, args: OnusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        OnusCommand::List {
            olt,
            pon_slot,
            pon_port,
            filter,
        } => {
            let pon = PonAddress::new(olt, pon_slot, pon_port);
            let client = ctx.connect().await?;
            let result = client
                .list_onus(&ctx.deadline(), &pon, filter.as_deref())
                .await;
            ctx.close(&client).await;

            let onus = result?;
            let out = output::render_list(&global.output, &onus, onu_row, |o| o.mac.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OnusCommand::Optical {
            olt,
            pon_slot,
            pon_port,
            mac,
        } => {
            let onu = OnuEndpoint::new(PonAddress::new(olt, pon_slot, pon_port), mac);
            let client = ctx.connect().await?;
            let result = client.optical_info(&ctx.deadline(), &onu).await;
            ctx.close(&client).await;

            let info = result?;
            let out = output::render_single(&global.output, &info, optical_detail, |o| {
                o.rx_power.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
