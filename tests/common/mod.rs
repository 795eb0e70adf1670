//! Helpers shared by the route tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use flightorder::{CompletionSignal, Error, TicketAllocator, TicketNode};

/// Allocator recording the sequence number of every released ticket.
#[derive(Debug, Default)]
pub struct RecordingAllocator {
    released: Mutex<Vec<u64>>,
}

impl RecordingAllocator {
    pub fn released(&self) -> Vec<u64> {
        self.released.lock().unwrap().clone()
    }
}

impl<S: CompletionSignal> TicketAllocator<S> for RecordingAllocator {
    fn acquire(&self) -> Arc<TicketNode<S>> {
        Arc::new(TicketNode::new())
    }

    fn release(&self, node: Arc<TicketNode<S>>) {
        self.released.lock().unwrap().push(node.seq());
        node.reset();
    }
}

/// Records callback entry and exit to prove callbacks never overlap.
#[derive(Debug, Default)]
pub struct CallLog {
    inner: Mutex<CallLogInner>,
}

#[derive(Debug, Default)]
struct CallLogInner {
    running: bool,
    order: Vec<u64>,
}

impl CallLog {
    pub fn enter(&self, seq: u64) {
        let mut inner = self.inner.lock().unwrap();
        assert!(!inner.running, "callback {} overlaps another callback", seq);
        inner.running = true;
        inner.order.push(seq);
    }

    pub fn exit(&self) {
        self.inner.lock().unwrap().running = false;
    }

    pub fn order(&self) -> Vec<u64> {
        self.inner.lock().unwrap().order.clone()
    }
}

/// Error type of the test callbacks.
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackError {
    Route(Error),
    Failed(u64),
}

impl From<Error> for CallbackError {
    fn from(err: Error) -> Self {
        CallbackError::Route(err)
    }
}
