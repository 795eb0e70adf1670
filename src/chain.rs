//! Chain of outstanding tickets shared by the sync and tokio routes.
//!
//! The chain has no queue container. Each node links back to the node issued
//! before it, and the route keeps only the tail. The state here is always
//! accessed under the route lock; the flavors differ only in how they wait
//! and which lock they use.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::allocator::TicketAllocator;
use crate::ticket::{CompletionSignal, Ticket, TicketNode};

static NEXT_ROUTE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique route id.
pub(crate) fn next_route_id() -> u64 {
    NEXT_ROUTE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) struct Chain<S> {
    route: u64,
    tail: Option<Arc<TicketNode<S>>>,
    next_seq: u64,
}

impl<S: CompletionSignal> Chain<S> {
    pub(crate) fn new(route: u64) -> Self {
        Self {
            route,
            tail: None,
            next_seq: 0,
        }
    }

    /// Issue a ticket behind the current tail and make it the new tail.
    pub(crate) fn issue(&mut self, allocator: &dyn TicketAllocator<S>) -> Ticket<S> {
        let node = allocator.acquire();
        node.set_seq(self.next_seq);
        node.set_predecessor(self.tail.take());
        self.next_seq += 1;
        self.tail = Some(Arc::clone(&node));
        tracing::trace!(route = self.route, seq = node.seq(), "ticket issued");
        Ticket::new(self.route, node)
    }

    /// Clear the tail if it is `node`.
    ///
    /// Returns false when another ticket has been issued after `node`.
    pub(crate) fn detach_tail(&mut self, node: &Arc<TicketNode<S>>) -> bool {
        match &self.tail {
            Some(tail) if Arc::ptr_eq(tail, node) => {
                self.tail = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn tail_seq(&self) -> Option<u64> {
        self.tail.as_ref().map(|tail| tail.seq())
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.tail.is_none()
    }
}

/// Raise the signal of a non-tail ticket after its callback ran.
///
/// A failed callback withholds the signal unless `signal_on_failure` is set.
pub(crate) fn settle<S: CompletionSignal, R, E>(
    route: u64,
    node: &TicketNode<S>,
    outcome: &Result<R, E>,
    signal_on_failure: bool,
) {
    let seq = node.seq();
    match outcome {
        Ok(_) => {
            node.signal().raise();
            tracing::trace!(route, seq, "completion signal raised");
        }
        Err(_) if signal_on_failure => {
            node.signal().raise();
            tracing::debug!(route, seq, "completion callback failed, signal raised anyway");
        }
        Err(_) => {
            tracing::warn!(
                route,
                seq,
                "completion callback failed, next ticket stays blocked until canceled"
            );
        }
    }
}
