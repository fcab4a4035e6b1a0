// Session lifecycle
//
// LOGIN / LOGOUT / SHAKEHAND as inherent methods on `UnmClient`. The
// public entry points take the session lock themselves, bounded by their
// deadline; the crate-private helpers expect the caller to hold it
// already (tokio's mutex is not reentrant).

use tracing::{debug, info, warn};

use crate::client::UnmClient;
use crate::command::Command;
use crate::deadline::Deadline;
use crate::error::Error;
use crate::transport::Transport;

impl<T: Transport> UnmClient<T> {
    /// Authenticate on the current socket.
    ///
    /// Normally unnecessary: every operation establishes a session on
    /// first use. Useful to fail fast on bad credentials.
    pub async fn login(&self, deadline: &Deadline) -> Result<(), Error> {
        let _setup = self.lock_session(deadline).await?;
        self.send_login(deadline).await?;
        self.set_authenticated(true);
        info!(user = %self.username(), "logged in to UNM");
        Ok(())
    }

    /// End the session. A no-op when the transport is already gone.
    pub async fn logout(&self, deadline: &Deadline) -> Result<(), Error> {
        let _setup = self.lock_session(deadline).await?;
        self.send_logout(deadline).await
    }

    /// Log out (best effort) and close the transport.
    pub async fn close(&self, deadline: &Deadline) -> Result<(), Error> {
        let _setup = self.lock_session(deadline).await?;
        self.shutdown_session(deadline).await
    }

    /// Keep-alive: `SHAKEHAND` within an authenticated session.
    pub async fn shake_hand(&self, deadline: &Deadline) -> Result<(), Error> {
        self.execute_with_retry(deadline, move || async move {
            self.send_command(deadline, Command::ShakeHand).await.map(drop)
        })
        .await
    }

    // ── Lock-held helpers ────────────────────────────────────────────

    pub(crate) async fn send_login(&self, deadline: &Deadline) -> Result<(), Error> {
        debug!(user = %self.username(), "sending login");
        self.send_command(
            deadline,
            Command::Login {
                username: self.username(),
                password: self.password(),
            },
        )
        .await
        .map(drop)
    }

    async fn send_logout(&self, deadline: &Deadline) -> Result<(), Error> {
        if !deadline.race(self.transport().is_connected()).await? {
            self.set_authenticated(false);
            return Ok(());
        }

        let result = self.send_command(deadline, Command::Logout).await.map(drop);
        self.set_authenticated(false);
        if result.is_ok() {
            debug!("logged out of UNM");
        }
        result
    }

    /// Logout then close. A logout failure is logged, the close result
    /// is what the caller sees.
    pub(crate) async fn shutdown_session(&self, deadline: &Deadline) -> Result<(), Error> {
        if let Err(e) = self.send_logout(deadline).await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
        // Still attempted after a timed-out logout; only waiting on a busy
        // socket is bounded.
        tokio::select! {
            biased;
            closed = self.transport().close() => closed,
            cause = deadline.expired() => Err(Error::Cancelled { cause }),
        }
    }
}
