// Deadlines and cancellation for blocking UNM exchanges.
//
// A TL1 exchange is a write followed by a read that can block for as long
// as the server takes to answer. `run_with_deadline` moves that work onto
// its own task and races it against the caller's deadline. The task is
// never aborted from outside; it gets an `abandoned` token instead and
// decides itself how to unwind (the TCP transport drops its socket).

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CancelCause, Error};

/// A point in time after which the caller no longer wants an answer,
/// plus an external cancellation signal.
///
/// Cheap to clone; clones share the cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: CancellationToken,
}

impl Deadline {
    /// No time limit; only explicit cancellation ends the call.
    pub fn none() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this deadline to an external cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that cancels this deadline early.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Time left before expiry, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Fail fast if the deadline already passed or was cancelled.
    pub fn check(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                cause: CancelCause::Cancelled,
            });
        }
        if self.remaining().is_some_and(|left| left.is_zero()) {
            return Err(Error::Cancelled {
                cause: CancelCause::DeadlineExceeded,
            });
        }
        Ok(())
    }

    /// Resolves once the deadline passes or the token is cancelled.
    pub async fn expired(&self) -> CancelCause {
        match self.at {
            Some(at) => tokio::select! {
                () = tokio::time::sleep_until(at) => CancelCause::DeadlineExceeded,
                () = self.cancel.cancelled() => CancelCause::Cancelled,
            },
            None => {
                self.cancel.cancelled().await;
                CancelCause::Cancelled
            }
        }
    }

    /// Await `work` unless the deadline fires first.
    ///
    /// `work` is dropped when it loses, so it must be cancel-safe, such as a
    /// lock acquisition or a dial.
    pub async fn race<F>(&self, work: F) -> Result<F::Output, Error>
    where
        F: Future + Send,
        F::Output: Send,
    {
        self.check()?;
        tokio::select! {
            biased;
            out = work => Ok(out),
            cause = self.expired() => Err(Error::Cancelled { cause }),
        }
    }
}

/// Run a blocking exchange on a spawned task and return the first of
/// {its result, deadline expiry}.
///
/// `task` receives an `abandoned` token that is cancelled when the
/// deadline wins the race. Work that has not started skips itself; work
/// already on the wire is expected to watch the token and unwind.
pub async fn run_with_deadline<T, F, Fut>(deadline: &Deadline, task: F) -> Result<T, Error>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, Error>> + Send + 'static,
    T: Send + 'static,
{
    deadline.check()?;

    let abandoned = CancellationToken::new();
    let mut handle = tokio::spawn(task(abandoned.clone()));

    tokio::select! {
        biased;
        joined = &mut handle => match joined {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                std::panic::resume_unwind(join_err.into_panic())
            }
            Err(_) => Err(Error::Cancelled { cause: CancelCause::Cancelled }),
        },
        cause = deadline.expired() => {
            abandoned.cancel();
            Err(Error::Cancelled { cause })
        }
    }
}
