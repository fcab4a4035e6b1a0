// TCP transport for the TL1 command channel.
//
// One socket, one command in flight. The transport knows about framing
// (responses end with `;`) and connection health, nothing about TL1
// semantics. Retry policy belongs to the protocol client; the only
// recovery done here is a single redial when the liveness probe fails or
// the previous exchange was abandoned.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::deadline::{Deadline, run_with_deadline};
use crate::error::{CancelCause, Error};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
pub const READ_BUFFER_SIZE: usize = 4096;
pub const COMMAND_TERMINATOR: u8 = b';';

/// Framed request/response exchange with a TL1 server.
///
/// The protocol client is generic over this trait so that session and
/// retry logic can be driven by a scripted transport in tests.
pub trait Transport: Send + Sync {
    /// Send one command and return the raw response, bounded by `deadline`.
    fn send(
        &self,
        deadline: &Deadline,
        command: &str,
    ) -> impl Future<Output = Result<String, Error>> + Send;

    /// Drop the current socket (if any) and dial a fresh one, giving up
    /// when `deadline` fires.
    fn reconnect(&self, deadline: &Deadline) -> impl Future<Output = Result<(), Error>> + Send;

    /// Close the socket. Idempotent.
    fn close(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// `true` iff not closed and the liveness probe succeeds.
    fn is_connected(&self) -> impl Future<Output = bool> + Send;
}

/// Connection tuning for [`TcpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// How long the liveness probe waits for the read to time out.
    pub probe_timeout: Duration,
}

impl TransportConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::Config {
                field: "host",
                reason: "hostname cannot be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(Error::Config {
                field: "port",
                reason: "port must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// TCP transport to a UNM server.
///
/// Cheaply cloneable via `Arc<TransportInner>`; clones share the socket.
/// The socket lives behind an async mutex that is held across the whole
/// write-then-read exchange, so concurrent callers never interleave
/// each other's responses.
#[derive(Clone)]
pub struct TcpTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    config: TransportConfig,
    conn: Mutex<ConnState>,
    /// Set when a caller gave up on an exchange; the socket may still hold
    /// an unread response and must be rebuilt before reuse.
    stale: AtomicBool,
}

struct ConnState {
    stream: Option<TcpStream>,
    closed: bool,
}

impl TcpTransport {
    /// Validate the config and establish the initial connection.
    pub async fn open(config: TransportConfig) -> Result<Self, Error> {
        config.validate()?;

        let stream = dial(&config).await?;
        debug!(address = %config.address(), "TL1 transport connected");

        Ok(Self {
            inner: Arc::new(TransportInner {
                config,
                conn: Mutex::new(ConnState {
                    stream: Some(stream),
                    closed: false,
                }),
                stale: AtomicBool::new(false),
            }),
        })
    }

    /// The `host:port` this transport dials.
    pub fn address(&self) -> String {
        self.inner.config.address()
    }

    /// Check liveness without consuming protocol data.
    ///
    /// A short timed 1-byte read: timing out means nothing is pending and
    /// the peer is still there. EOF, unsolicited bytes or a read error all
    /// count as dead.
    pub async fn probe(&self) -> Result<(), Error> {
        let mut conn = self.inner.conn.lock().await;
        if conn.closed {
            return Err(Error::NotConnected);
        }
        if self.inner.stale.load(Ordering::Acquire) {
            return Err(Error::ConnectionLost {
                during: "a cancelled exchange",
            });
        }
        let stream = conn.stream.as_mut().ok_or(Error::NotConnected)?;
        probe(stream, self.inner.config.probe_timeout).await
    }

    /// Write `command` and read until the terminator, holding the socket
    /// lock for the whole exchange.
    async fn exchange(&self, command: &str, abandoned: &CancellationToken) -> Result<String, Error> {
        let mut conn = self.inner.conn.lock().await;

        // The caller stopped waiting while we queued for the lock.
        if abandoned.is_cancelled() {
            return Err(Error::Cancelled {
                cause: CancelCause::Cancelled,
            });
        }
        if conn.closed {
            return Err(Error::NotConnected);
        }

        self.ensure_live(&mut conn).await?;
        let stream = conn.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!(bytes = command.len(), "writing TL1 command");
        let result = tokio::select! {
            result = write_and_read(stream, command) => result,
            () = abandoned.cancelled() => Err(Error::Cancelled {
                cause: CancelCause::Cancelled,
            }),
        };

        if let Err(ref e) = result {
            if e.is_transport() || e.is_cancelled() {
                // Broken, or may still receive an answer nobody reads.
                conn.stream = None;
            }
        }
        result
    }

    /// Probe the socket and redial once if it looks dead.
    async fn ensure_live(&self, conn: &mut ConnState) -> Result<(), Error> {
        let was_stale = self.inner.stale.swap(false, Ordering::AcqRel);

        let healthy = match conn.stream.as_mut() {
            Some(stream) if !was_stale => {
                match probe(stream, self.inner.config.probe_timeout).await {
                    Ok(()) => true,
                    Err(e) => {
                        debug!(error = %e, "liveness probe failed");
                        false
                    }
                }
            }
            _ => false,
        };

        if !healthy {
            warn!(address = %self.address(), stale = was_stale, "reconnecting TL1 transport");
            conn.stream = None;
            let stream = dial(&self.inner.config).await.map_err(|e| match e {
                Error::Connect { address, reason } => Error::Connect {
                    address,
                    reason: format!("reconnection failed: {reason}"),
                },
                other => other,
            })?;
            conn.stream = Some(stream);
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    async fn send(&self, deadline: &Deadline, command: &str) -> Result<String, Error> {
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }
        deadline.check()?;

        let this = self.clone();
        let command = command.to_owned();
        let result = run_with_deadline(deadline, move |abandoned| async move {
            this.exchange(&command, &abandoned).await
        })
        .await;

        if matches!(result, Err(Error::Cancelled { .. })) {
            self.inner.stale.store(true, Ordering::Release);
        }
        result
    }

    async fn reconnect(&self, deadline: &Deadline) -> Result<(), Error> {
        let mut conn = deadline.race(self.inner.conn.lock()).await?;

        if let Some(mut old) = conn.stream.take() {
            // Best effort: the old socket is being thrown away regardless.
            let _ = old.shutdown().await;
        }

        // Whichever is sooner of the connect timeout and the deadline.
        let stream = deadline.race(dial(&self.inner.config)).await??;
        conn.stream = Some(stream);
        conn.closed = false;
        self.inner.stale.store(false, Ordering::Release);

        debug!(address = %self.address(), "TL1 transport reconnected");
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        let mut conn = self.inner.conn.lock().await;
        conn.closed = true;

        if let Some(mut stream) = conn.stream.take() {
            debug!(address = %self.address(), "closing TL1 transport");
            stream.shutdown().await.map_err(|source| Error::Io {
                during: "shutdown",
                source,
            })?;
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.probe().await.is_ok()
    }
}

async fn dial(config: &TransportConfig) -> Result<TcpStream, Error> {
    let address = config.address();
    debug!(%address, "dialing TL1 server");

    match tokio::time::timeout(
        config.connect_timeout,
        TcpStream::connect((config.host.as_str(), config.port)),
    )
    .await
    {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(Error::Connect {
            address,
            reason: e.to_string(),
        }),
        Err(_) => Err(Error::Connect {
            address,
            reason: format!("timed out after {}s", config.connect_timeout.as_secs()),
        }),
    }
}

async fn probe(stream: &mut TcpStream, timeout: Duration) -> Result<(), Error> {
    let mut byte = [0u8; 1];
    match tokio::time::timeout(timeout, stream.read(&mut byte)).await {
        Err(_) => Ok(()),
        Ok(Ok(0)) => Err(Error::ConnectionLost { during: "probing" }),
        Ok(Ok(_)) => Err(Error::ConnectionLost {
            during: "probing (unsolicited data)",
        }),
        Ok(Err(source)) => Err(Error::Io {
            during: "probe",
            source,
        }),
    }
}

async fn write_and_read(stream: &mut TcpStream, command: &str) -> Result<String, Error> {
    stream
        .write_all(command.as_bytes())
        .await
        .map_err(|source| Error::Io {
            during: "write",
            source,
        })?;

    read_response(stream).await
}

/// Accumulate chunks until one ends (modulo whitespace) with `;` or the
/// peer closes the stream.
async fn read_response(stream: &mut TcpStream) -> Result<String, Error> {
    let mut response = Vec::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = stream.read(&mut buffer).await.map_err(|source| Error::Io {
            during: "read",
            source,
        })?;
        if n == 0 {
            break;
        }

        let chunk = &buffer[..n];
        response.extend_from_slice(chunk);

        if chunk.trim_ascii_end().ends_with(&[COMMAND_TERMINATOR]) {
            break;
        }
    }

    if response.is_empty() {
        return Err(Error::InvalidResponse);
    }
    Ok(String::from_utf8_lossy(&response).into_owned())
}
