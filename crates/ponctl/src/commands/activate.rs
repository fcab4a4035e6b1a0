//! `activate`: provision the ONU recorded for a service protocol.

use std::sync::Arc;

use ponctl_core::{InMemoryRepository, ProvisioningOutcome, ProvisioningService};

use crate::cli::{ActivateArgs, GlobalOpts};
use crate::commands::CommandContext;
use crate::error::CliError;
use crate::output;

fn detail(o: &ProvisioningOutcome) -> String {
    let (tx, rx) = o.signal.as_ref().map_or_else(
        || ("unavailable".to_owned(), "unavailable".to_owned()),
        |s| (s.tx_power.clone(), s.rx_power.clone()),
    );
    output::detail_block(&[
        ("Protocol", o.protocol.to_string()),
        ("Serial", o.serial.clone()),
        ("Client", o.client_name.clone()),
        ("Tx power", tx),
        ("Rx power", rx),
    ])
}

pub async fn handle(
    ctx: &CommandContext,
    args: &ActivateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let repository =
        InMemoryRepository::load(&args.connections).map_err(|e| CliError::InvalidFile {
            path: args.connections.display().to_string(),
            reason: e.to_string(),
        })?;

    let client = Arc::new(ctx.connect().await?);
    let service =
        ProvisioningService::new(Arc::clone(&client), repository).with_model(&ctx.settings.model);

    let result = service.provision(&ctx.deadline(), args.protocol).await;
    ctx.close(&client).await;

    let outcome = result?;
    let out = output::render_single(&global.output, &outcome, detail, |o| o.serial.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
