//! Blocking completion signal.

use crossbeam_channel::{Receiver, Select, Sender};

use crate::error::Result;
use crate::ticket::CompletionSignal;

use super::Context;

/// Single-slot signal backed by a `bounded(1)` channel.
#[derive(Debug)]
pub struct BlockingSignal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Default for BlockingSignal {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        Self { tx, rx }
    }
}

impl CompletionSignal for BlockingSignal {
    fn raise(&self) {
        assert!(
            self.tx.try_send(()).is_ok(),
            "completion signal raised twice"
        );
    }

    fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl BlockingSignal {
    /// Block until the signal is raised and consume it, or until `ctx` is
    /// done. An interrupted wait leaves the signal untouched.
    pub(crate) fn wait(&self, ctx: &Context) -> Result<()> {
        let deadline = ctx.deadline().map(crossbeam_channel::at);

        let mut sel = Select::new();
        let signal_index = sel.recv(&self.rx);
        if let Some(rx) = &deadline {
            sel.recv(rx);
        }
        for rx in ctx.cancel_receivers() {
            sel.recv(rx);
        }

        // `ready` may wake spuriously, so every wakeup is re-checked.
        loop {
            if sel.ready() == signal_index {
                if self.rx.try_recv().is_ok() {
                    return Ok(());
                }
            } else if let Some(err) = ctx.err() {
                return Err(err);
            }
        }
    }
}
