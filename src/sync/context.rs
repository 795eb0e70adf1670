//! Cancellation context for blocking waits.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::error::Error;

/// Deadline and cancellation carried into `Route::complete_ticket`.
///
/// Only the wait for the previous ticket observes the context; a running
/// completion callback is never interrupted. Derived contexts keep every
/// deadline and cancel handle of their parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<Receiver<()>>,
}

impl Context {
    /// A context that is never canceled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires at `deadline`.
    ///
    /// An earlier deadline already on the context is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derive a context that expires `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context canceled when the returned handle is canceled or
    /// dropped.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        self.cancel.push(rx);
        (self, CancelHandle { _tx: tx })
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<Error> {
        if self.cancel.iter().any(is_disconnected) {
            return Some(Error::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns true if the context is canceled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    pub(crate) fn cancel_receivers(&self) -> &[Receiver<()>] {
        &self.cancel
    }
}

/// Cancels the context created alongside it.
///
/// Nothing is ever sent on the channel; dropping the sender disconnects it,
/// which every blocked wait observes at once.
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<()>,
}

impl CancelHandle {
    /// Cancel the context. Same as dropping the handle.
    pub fn cancel(self) {}
}

fn is_disconnected(rx: &Receiver<()>) -> bool {
    matches!(
        rx.try_recv(),
        Err(crossbeam_channel::TryRecvError::Disconnected)
    )
}
