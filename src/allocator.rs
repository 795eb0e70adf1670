//! Ticket allocators.

use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::opts::{AllocatorKind, Opts};
use crate::ticket::{CompletionSignal, TicketNode};

/// Produces and recycles ticket nodes for a route.
///
/// Implementations are shared by every task using the route and must not
/// rely on the route lock for their own synchronization. `release` must call
/// [`TicketNode::reset`] before the node is dropped or reused.
pub trait TicketAllocator<S: CompletionSignal>: Send + Sync {
    /// Hand out a node with no predecessor and no pending notification.
    fn acquire(&self) -> Arc<TicketNode<S>>;

    /// Take back a node whose ticket has finished.
    fn release(&self, node: Arc<TicketNode<S>>);
}

/// Allocator without any reuse. Released nodes are reset and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdAllocator;

impl<S: CompletionSignal> TicketAllocator<S> for StdAllocator {
    fn acquire(&self) -> Arc<TicketNode<S>> {
        Arc::new(TicketNode::new())
    }

    fn release(&self, node: Arc<TicketNode<S>>) {
        node.reset();
    }
}

/// Allocator that recycles released nodes through a bounded pool.
#[derive(Debug)]
pub struct PoolAllocator<S: CompletionSignal> {
    nodes: ArrayQueue<Arc<TicketNode<S>>>,
}

impl<S: CompletionSignal> PoolAllocator<S> {
    /// Create a pool keeping at most `capacity` idle nodes.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Number of idle nodes waiting to be reused.
    pub fn idle(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum number of idle nodes.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }
}

impl<S: CompletionSignal> Default for PoolAllocator<S> {
    fn default() -> Self {
        Self::new(Opts::default().pool_capacity)
    }
}

impl<S: CompletionSignal> TicketAllocator<S> for PoolAllocator<S> {
    fn acquire(&self) -> Arc<TicketNode<S>> {
        self.nodes
            .pop()
            .unwrap_or_else(|| Arc::new(TicketNode::new()))
    }

    fn release(&self, node: Arc<TicketNode<S>>) {
        node.reset();
        // Ignore if pool is full
        let _ = self.nodes.push(node);
    }
}

/// Build the allocator selected in `opts`.
pub(crate) fn from_opts<S: CompletionSignal>(opts: &Opts) -> Arc<dyn TicketAllocator<S>> {
    match opts.allocator {
        AllocatorKind::Std => Arc::new(StdAllocator),
        AllocatorKind::Pool => Arc::new(PoolAllocator::<S>::new(opts.pool_capacity)),
    }
}
