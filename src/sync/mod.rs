//! Blocking route for threads.

mod context;
mod route;
mod signal;

pub use context::{CancelHandle, Context};
pub use route::{Route, Ticket};
pub use signal::BlockingSignal;
