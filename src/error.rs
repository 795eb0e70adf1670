//! Error types for flightorder.

use thiserror::Error;

/// Result type for flightorder operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for flightorder.
///
/// Completion callbacks return their own error type `E: From<Error>`, so
/// these variants reach the caller through `?` while callback errors are
/// returned untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The cancellation handle fired while waiting for the previous ticket
    #[error("wait for previous ticket: canceled")]
    Canceled,

    /// The context deadline passed while waiting for the previous ticket
    #[error("wait for previous ticket: deadline exceeded")]
    DeadlineExceeded,

    /// Invalid usage (e.g., completing a ticket twice)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),
}

impl Error {
    /// Returns true if the error came from an interrupted wait.
    ///
    /// The ticket is still part of its route and can be completed again.
    pub fn is_wait_canceled(&self) -> bool {
        matches!(self, Error::Canceled | Error::DeadlineExceeded)
    }
}
