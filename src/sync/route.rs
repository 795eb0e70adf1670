//! Blocking route.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::allocator::{self, TicketAllocator};
use crate::chain::{self, Chain};
use crate::error::Error;
use crate::opts::Opts;

use super::{BlockingSignal, Context};

/// Ticket issued by a blocking [`Route`].
pub type Ticket = crate::ticket::Ticket<BlockingSignal>;

/// Orders completions of tickets by issuance, for threads.
///
/// Tickets are taken in order with [`Route::take_ticket`] and completed from
/// any thread with [`Route::complete_ticket_with`]. Completion callbacks run
/// one at a time, in the order the tickets were taken.
///
/// The route lock is held for the whole callback, so a slow callback stalls
/// every later completion on the route.
pub struct Route {
    id: u64,
    opts: Opts,
    allocator: Arc<dyn TicketAllocator<BlockingSignal>>,
    chain: Mutex<Chain<BlockingSignal>>,
}

impl Route {
    /// Create a route with default options.
    pub fn new() -> Self {
        Self::with_opts(Opts::default())
    }

    /// Create a route using the allocator selected in `opts`.
    pub fn with_opts(opts: Opts) -> Self {
        let allocator = allocator::from_opts(&opts);
        Self::with_allocator(opts, allocator)
    }

    /// Create a route with a custom allocator. `opts.allocator` is ignored.
    pub fn with_allocator(
        opts: Opts,
        allocator: Arc<dyn TicketAllocator<BlockingSignal>>,
    ) -> Self {
        let id = chain::next_route_id();
        Self {
            id,
            opts,
            allocator,
            chain: Mutex::new(Chain::new(id)),
        }
    }

    /// Process-unique id of this route.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The allocator producing this route's tickets.
    pub fn allocator(&self) -> &Arc<dyn TicketAllocator<BlockingSignal>> {
        &self.allocator
    }

    /// Take the next ticket.
    pub fn take_ticket(&self) -> Ticket {
        self.lock_chain().issue(self.allocator.as_ref())
    }

    /// Complete a ticket without a callback.
    ///
    /// See [`Route::complete_ticket_with`].
    pub fn complete_ticket(&self, ctx: &Context, ticket: &mut Ticket) -> Result<(), Error> {
        self.complete_ticket_with(ctx, ticket, || Ok(()))
    }

    /// Complete a ticket, running `f` once every earlier ticket is complete.
    ///
    /// Blocks until the previous ticket has completed, then runs `f` under
    /// the route lock and returns its result.
    ///
    /// # Errors
    ///
    /// - `Error::Canceled` or `Error::DeadlineExceeded` if `ctx` is done
    ///   before the previous ticket completes. `f` is not run and the ticket
    ///   stays valid, so it can be completed again.
    /// - `Error::InvalidUsage` if the ticket was already completed or was
    ///   issued by another route.
    /// - Whatever `f` returns. Unless `Opts::signal_on_failure` is set, the
    ///   next ticket then waits until its own context is done.
    pub fn complete_ticket_with<F, R, E>(&self, ctx: &Context, ticket: &mut Ticket, f: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
        E: From<Error>,
    {
        let node = Arc::clone(ticket.node(self.id)?);
        let seq = node.seq();

        if let Some(prev) = node.predecessor() {
            if let Err(err) = prev.signal().wait(ctx) {
                tracing::debug!(route = self.id, seq, error = %err, "wait for previous ticket interrupted");
                return Err(err.into());
            }
            node.clear_predecessor();
            self.allocator.release(prev);
        }

        let mut chain = self.lock_chain();
        ticket.spend();

        // Last ticket on the route. Nothing can be waiting on it.
        if chain.detach_tail(&node) {
            self.allocator.release(node);
            tracing::trace!(route = self.id, seq, "tail ticket completed");
            return f();
        }

        let outcome = f();
        chain::settle(self.id, &node, &outcome, self.opts.signal_on_failure);
        drop(chain);
        outcome
    }

    /// Returns true if every issued ticket has been released.
    pub fn is_idle(&self) -> bool {
        self.lock_chain().is_idle()
    }

    /// Sequence number of the most recently issued, unreleased ticket.
    pub fn tail_seq(&self) -> Option<u64> {
        self.lock_chain().tail_seq()
    }

    fn lock_chain(&self) -> MutexGuard<'_, Chain<BlockingSignal>> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}
