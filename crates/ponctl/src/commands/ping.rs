//! `ping`: log in and exchange a SHAKEHAND.

use std::time::Instant;

use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::commands::CommandContext;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PingReport {
    address: String,
    username: String,
    latency_ms: u64,
}

fn detail(r: &PingReport) -> String {
    output::detail_block(&[
        ("Server", r.address.clone()),
        ("User", r.username.clone()),
        ("Latency", format!("{} ms", r.latency_ms)),
    ])
}

pub async fn handle(ctx: &CommandContext, global: &GlobalOpts) -> Result<(), CliError> {
    let started = Instant::now();
    let client = ctx.connect().await?;
    let result = client.shake_hand(&ctx.deadline()).await;
    ctx.close(&client).await;
    result?;

    let report = PingReport {
        address: ctx.settings.client.transport.address(),
        username: ctx.settings.client.username.clone(),
        latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    let out = output::render_single(&global.output, &report, detail, |r| r.address.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
