// UNM protocol client
//
// Wraps a `Transport` with the TL1 session: command rendering, server
// error detection, the authenticated-session flag and the retry loop
// that re-authenticates when the server reports an illegal session.
// Endpoint operations live in sibling modules as inherent methods
// (`session`, `onu`, `provisioning`) to keep this file on mechanics.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::SecretString;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::ClientConfig;
use crate::deadline::Deadline;
use crate::decode::check_response;
use crate::error::Error;
use crate::transport::{TcpTransport, Transport};

/// Attempts made by [`UnmClient::execute_with_retry`] before giving up.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// TL1 client for a UNM management server.
///
/// One instance owns one transport and one authenticated session. It is
/// safe to share between tasks: session setup and teardown sit behind one
/// async mutex, and the transport serializes exchanges on the wire. Every
/// public operation takes a [`Deadline`], including the wait for that
/// mutex.
pub struct UnmClient<T = TcpTransport> {
    username: String,
    password: SecretString,
    transport: T,
    /// Held while logging in, logging out or redialing.
    session: Mutex<()>,
    /// Independent from the transport's socket state. Cleared without
    /// the mutex so a caller giving up never queues behind a login.
    authenticated: AtomicBool,
}

impl UnmClient<TcpTransport> {
    /// Dial the UNM server. Does NOT log in -- the first operation does.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let transport = TcpTransport::open(config.transport).await?;
        Ok(Self::new(config.username, config.password, transport))
    }
}

impl<T: Transport> UnmClient<T> {
    /// Build a client over an already-open transport.
    pub fn new(username: impl Into<String>, password: SecretString, transport: T) -> Self {
        Self {
            username: username.into(),
            password,
            transport,
            session: Mutex::new(()),
            authenticated: AtomicBool::new(false),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether the client currently believes it holds a valid session.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    /// Wait for the session mutex, giving up when `deadline` fires.
    pub(crate) async fn lock_session(
        &self,
        deadline: &Deadline,
    ) -> Result<MutexGuard<'_, ()>, Error> {
        deadline.race(self.session.lock()).await
    }

    pub(crate) fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::Release);
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send one command and surface any `EADD=` rejection as an error.
    pub(crate) async fn send_command(
        &self,
        deadline: &Deadline,
        command: Command<'_>,
    ) -> Result<String, Error> {
        let verb: &'static str = command.verb().into();
        debug!(verb, "sending TL1 command");

        let response = self.transport.send(deadline, &command.to_wire()).await?;
        check_response(&response)?;
        Ok(response)
    }

    /// Run `operation` inside an authenticated session, re-authenticating
    /// and retrying when the server reports an illegal session.
    ///
    /// Any other failure is returned as-is on the first occurrence. After
    /// [`MAX_RETRY_ATTEMPTS`] illegal-session failures the last one is
    /// wrapped in [`Error::MaxRetriesExceeded`].
    pub(crate) async fn execute_with_retry<R, F, Fut>(
        &self,
        deadline: &Deadline,
        mut operation: F,
    ) -> Result<R, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let outcome = match self.ensure_session(deadline).await {
                Ok(()) => operation().await,
                Err(e) => Err(e),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_illegal_session() {
                if err.is_cancelled() || err.is_transport() {
                    // The socket may hold an unread answer or be gone.
                    self.set_authenticated(false);
                }
                return Err(err);
            }

            self.set_authenticated(false);

            if attempt >= MAX_RETRY_ATTEMPTS {
                return Err(Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            warn!(attempt, error = %err, "UNM session invalidated, re-authenticating");
        }
    }

    /// Make sure both the socket and the login are usable.
    async fn ensure_session(&self, deadline: &Deadline) -> Result<(), Error> {
        let _setup = self.lock_session(deadline).await?;
        if self.is_authenticated() {
            return Ok(());
        }

        if deadline.race(self.transport.is_connected()).await? {
            // A live socket without a trusted session: start clean.
            if let Err(e) = self.shutdown_session(deadline).await {
                debug!(error = %e, "closing previous session failed");
            }
        }

        self.reconnect_and_login(deadline).await?;
        self.set_authenticated(true);
        info!(user = %self.username, "UNM session established");
        Ok(())
    }

    async fn reconnect_and_login(&self, deadline: &Deadline) -> Result<(), Error> {
        self.transport.reconnect(deadline).await?;

        if let Err(e) = self.send_login(deadline).await {
            if let Err(close_err) = self.transport.close().await {
                debug!(error = %close_err, "closing transport after failed login");
            }
            return Err(e);
        }
        Ok(())
    }
}
