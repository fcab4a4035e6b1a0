//! Command dispatch: bridges CLI args -> UNM operations -> output formatting.

pub mod activate;
pub mod config_cmd;
pub mod onus;
pub mod ping;
pub mod provision;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ponctl_api::{Deadline, UnmClient};

use crate::cli::{Command, GlobalOpts};
use crate::config::ConnectionSettings;
use crate::error::CliError;

/// Budget for the LOGOUT sent after a command, independent of its deadline.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-invocation state shared by the server-bound handlers.
pub struct CommandContext {
    pub settings: ConnectionSettings,
    cancel: CancellationToken,
}

impl CommandContext {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Open the TL1 socket. The session itself starts on first use.
    pub async fn connect(&self) -> Result<UnmClient, CliError> {
        debug!(address = %self.settings.client.transport.address(), "connecting to UNM");
        Ok(UnmClient::connect(self.settings.client.clone()).await?)
    }

    /// Deadline for one command: the configured timeout, or Ctrl-C.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.settings.timeout()).with_cancel(self.cancel.clone())
    }

    /// Log out and drop the socket. Failures only warn: the command result
    /// has already been decided.
    pub async fn close(&self, client: &UnmClient) {
        if let Err(e) = client.close(&Deadline::after(CLOSE_TIMEOUT)).await {
            warn!(error = %e, "closing UNM session failed");
        }
    }

    fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling");
                cancel.cancel();
            }
        });
    }
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    settings: ConnectionSettings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ctx = CommandContext::new(settings);
    ctx.cancel_on_ctrl_c();

    match cmd {
        Command::Onus(args) => onus::handle(&ctx, args, global).await,
        Command::Provision(args) => provision::handle(&ctx, args, global).await,
        Command::Activate(args) => activate::handle(&ctx, &args, global).await,
        Command::Ping => ping::handle(&ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
