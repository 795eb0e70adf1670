//! Tickets and their completion signals.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

/// One-shot, single-slot notification raised by a completed ticket.
///
/// There is exactly one producer (the ticket's own completion) and at most
/// one consumer (the next ticket waiting on it). Each route flavor brings its
/// own implementation with a matching wait operation.
pub trait CompletionSignal: Default + Send + Sync + 'static {
    /// Store the pending notification.
    ///
    /// # Panics
    ///
    /// Panics if a notification is already pending.
    fn raise(&self);

    /// Returns true if a raised notification has not been consumed yet.
    fn is_pending(&self) -> bool;
}

/// The node behind a [`Ticket`], produced and recycled by a
/// [`TicketAllocator`](crate::TicketAllocator).
pub struct TicketNode<S> {
    seq: AtomicU64,
    prev: Mutex<Option<Arc<TicketNode<S>>>>,
    signal: S,
}

impl<S: CompletionSignal> TicketNode<S> {
    /// Create an empty node: no predecessor, no pending notification.
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            prev: Mutex::new(None),
            signal: S::default(),
        }
    }

    /// Clear the node so it can be dropped or handed out again.
    ///
    /// Allocators must call this from `release`.
    ///
    /// # Panics
    ///
    /// Panics if the completion signal still holds a notification. That only
    /// happens when the completion protocol is broken, and reusing such a
    /// node would let a future ticket skip its wait.
    pub fn reset(&self) {
        lock(&self.prev).take();
        assert!(
            !self.signal.is_pending(),
            "ticket {} released with a pending completion signal",
            self.seq()
        );
    }

    pub(crate) fn signal(&self) -> &S {
        &self.signal
    }
}

impl<S: CompletionSignal> Default for TicketNode<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TicketNode<S> {
    /// Sequence number of the ticket currently using this node.
    pub fn seq(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    /// Returns true if the node still links to the ticket issued before it.
    pub fn has_predecessor(&self) -> bool {
        lock(&self.prev).is_some()
    }

    pub(crate) fn set_seq(&self, seq: u64) {
        self.seq.store(seq, Ordering::Relaxed);
    }

    pub(crate) fn predecessor(&self) -> Option<Arc<TicketNode<S>>> {
        lock(&self.prev).clone()
    }

    pub(crate) fn set_predecessor(&self, prev: Option<Arc<TicketNode<S>>>) {
        *lock(&self.prev) = prev;
    }

    pub(crate) fn clear_predecessor(&self) {
        lock(&self.prev).take();
    }
}

impl<S> Drop for TicketNode<S> {
    fn drop(&mut self) {
        // Unlink abandoned chains iteratively instead of recursing per node.
        let mut next = self
            .prev
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut node) => node
                    .prev
                    .get_mut()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take(),
                Err(_) => None,
            };
        }
    }
}

impl<S: CompletionSignal> fmt::Debug for TicketNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketNode")
            .field("seq", &self.seq())
            .field("has_predecessor", &self.has_predecessor())
            .field("pending", &self.signal.is_pending())
            .finish()
    }
}

/// A reserved position in a route's completion order.
///
/// Obtained from `Route::take_ticket` and handed back to
/// `Route::complete_ticket`. Completion spends the ticket unless the wait for
/// the previous ticket was canceled, in which case it can be completed again.
pub struct Ticket<S> {
    route: u64,
    seq: u64,
    node: Option<Arc<TicketNode<S>>>,
}

impl<S> Ticket<S> {
    pub(crate) fn new(route: u64, node: Arc<TicketNode<S>>) -> Self {
        Self {
            route,
            seq: node.seq(),
            node: Some(node),
        }
    }

    /// Issuance sequence number within the route, starting at 0.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns true once the ticket has gone through completion.
    pub fn is_spent(&self) -> bool {
        self.node.is_none()
    }

    /// Borrow the node, checking that the ticket belongs to `route` and has
    /// not been completed yet.
    pub(crate) fn node(&self, route: u64) -> Result<&Arc<TicketNode<S>>> {
        if self.route != route {
            return Err(Error::InvalidUsage(format!(
                "ticket {} was issued by route {}, not route {}",
                self.seq, self.route, route
            )));
        }
        self.node.as_ref().ok_or_else(|| {
            Error::InvalidUsage(format!("ticket {} already completed", self.seq))
        })
    }

    pub(crate) fn spend(&mut self) -> Option<Arc<TicketNode<S>>> {
        self.node.take()
    }
}

impl<S> fmt::Debug for Ticket<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("route", &self.route)
            .field("seq", &self.seq)
            .field("spent", &self.is_spent())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
