//! Async route for tokio tasks.

mod route;
mod signal;

pub use route::{Route, Ticket};
pub use signal::AsyncSignal;
