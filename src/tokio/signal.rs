//! Async completion signal.

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::ticket::CompletionSignal;

/// Single-slot signal backed by a semaphore that starts with no permits.
#[derive(Debug)]
pub struct AsyncSignal {
    permits: Semaphore,
}

impl Default for AsyncSignal {
    fn default() -> Self {
        Self {
            permits: Semaphore::new(0),
        }
    }
}

impl CompletionSignal for AsyncSignal {
    fn raise(&self) {
        assert!(
            self.permits.available_permits() == 0,
            "completion signal raised twice"
        );
        self.permits.add_permits(1);
    }

    fn is_pending(&self) -> bool {
        self.permits.available_permits() > 0
    }
}

impl AsyncSignal {
    /// Wait until the signal is raised and consume it, or until `cancel`
    /// fires. An interrupted wait leaves the signal untouched, and so does
    /// dropping the future.
    pub(crate) async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            permit = self.permits.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                // The semaphore is never closed.
                Err(_closed) => Err(Error::Canceled),
            },
            () = cancel.cancelled() => Err(Error::Canceled),
        }
    }
}
