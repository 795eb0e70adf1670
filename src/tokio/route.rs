//! Async route.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::allocator::{self, TicketAllocator};
use crate::chain::{self, Chain};
use crate::error::Error;
use crate::opts::Opts;

use super::AsyncSignal;

/// Ticket issued by an async [`Route`].
pub type Ticket = crate::ticket::Ticket<AsyncSignal>;

/// Orders completions of tickets by issuance, for tokio tasks.
///
/// Same protocol as the blocking route. The route lock is a tokio mutex held
/// across the completion future, so callbacks may await.
pub struct Route {
    id: u64,
    opts: Opts,
    allocator: Arc<dyn TicketAllocator<AsyncSignal>>,
    chain: Mutex<Chain<AsyncSignal>>,
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
    pub fn with_allocator(opts: Opts, allocator: Arc<dyn TicketAllocator<AsyncSignal>>) -> Self {
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
    pub fn allocator(&self) -> &Arc<dyn TicketAllocator<AsyncSignal>> {
        &self.allocator
    }

    /// Take the next ticket.
    ///
    /// Waits for the route lock, which a running completion callback holds.
    pub async fn take_ticket(&self) -> Ticket {
        self.chain.lock().await.issue(self.allocator.as_ref())
    }

    /// Complete a ticket without a callback.
    pub async fn complete_ticket(
        &self,
        cancel: &CancellationToken,
        ticket: &mut Ticket,
    ) -> Result<(), Error> {
        self.complete_ticket_with(cancel, ticket, || async { Ok(()) })
            .await
    }

    /// Complete a ticket, running `f` once every earlier ticket is complete.
    ///
    /// # Errors
    ///
    /// - `Error::Canceled` if `cancel` fires before the previous ticket
    ///   completes. `f` is not run and the ticket can be completed again.
    /// - `Error::InvalidUsage` if the ticket was already completed or was
    ///   issued by another route.
    /// - Whatever `f` resolves to.
    ///
    /// # Cancel safety
    ///
    /// Dropping the future while it waits for the previous ticket or for the
    /// route lock leaves the ticket valid. Dropping it while `f` runs spends
    /// the ticket without signaling the next one.
    pub async fn complete_ticket_with<F, Fut, R, E>(
        &self,
        cancel: &CancellationToken,
        ticket: &mut Ticket,
        f: F,
    ) -> Result<R, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<Error>,
    {
        let node = Arc::clone(ticket.node(self.id)?);
        let seq = node.seq();

        if let Some(prev) = node.predecessor() {
            if let Err(err) = prev.signal().wait(cancel).await {
                tracing::debug!(route = self.id, seq, error = %err, "wait for previous ticket interrupted");
                return Err(err.into());
            }
            node.clear_predecessor();
            self.allocator.release(prev);
        }

        let mut chain = self.chain.lock().await;
        ticket.spend();

        if chain.detach_tail(&node) {
            self.allocator.release(node);
            tracing::trace!(route = self.id, seq, "tail ticket completed");
            return f().await;
        }

        let outcome = f().await;
        chain::settle(self.id, &node, &outcome, self.opts.signal_on_failure);
        drop(chain);
        outcome
    }

    /// Returns true if every issued ticket has been released.
    pub async fn is_idle(&self) -> bool {
        self.chain.lock().await.is_idle()
    }

    /// Sequence number of the most recently issued, unreleased ticket.
    pub async fn tail_seq(&self) -> Option<u64> {
        self.chain.lock().await.tail_seq()
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
