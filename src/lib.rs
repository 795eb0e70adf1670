//! In-order completion of concurrently finished work.
//!
//! Take tickets from a route in the order work is submitted, finish the work
//! on any thread or task, then complete each ticket with a callback. Callbacks
//! run one at a time and strictly in ticket order, whatever order the
//! completions arrive in.
//!
//! # Features
//!
//! - **Sync and async routes**: `sync::Route` blocks threads, `tokio::Route`
//!   suspends tasks
//! - **Cancellable waits**: deadlines and cancel handles for threads,
//!   `CancellationToken` for tasks
//! - **Pluggable allocation**: fresh tickets, a reuse pool, or your own
//!   `TicketAllocator`
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::thread;
//!
//! use flightorder::sync::{Context, Route};
//!
//! fn main() -> flightorder::Result<()> {
//!     let route = Arc::new(Route::new());
//!     let output = Arc::new(Mutex::new(Vec::new()));
//!
//!     let handles: Vec<_> = (0..4)
//!         .map(|i| {
//!             let mut ticket = route.take_ticket();
//!             let route = Arc::clone(&route);
//!             let output = Arc::clone(&output);
//!             thread::spawn(move || {
//!                 let squared = i * i;
//!                 route.complete_ticket_with(&Context::background(), &mut ticket, || {
//!                     output.lock().unwrap().push(squared);
//!                     Ok::<_, flightorder::Error>(())
//!                 })
//!             })
//!         })
//!         .collect();
//!
//!     for handle in handles {
//!         handle.join().unwrap()?;
//!     }
//!     assert_eq!(*output.lock().unwrap(), vec![0, 1, 4, 9]);
//!     Ok(())
//! }
//! ```

pub mod allocator;
mod chain;
pub mod error;
pub mod opts;
pub mod ticket;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use allocator::{PoolAllocator, StdAllocator, TicketAllocator};
pub use error::{Error, Result};
pub use opts::{AllocatorKind, Opts};
pub use ticket::{CompletionSignal, Ticket, TicketNode};
