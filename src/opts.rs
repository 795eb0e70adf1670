//! Route options.

use std::str::FromStr;

use no_panic::no_panic;

use crate::error::Error;

const POOL_CAPACITY: usize = 128;

/// Ticket allocation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocatorKind {
    /// Allocate a fresh ticket every time, drop it on release
    #[default]
    Std,
    /// Recycle released tickets through a bounded pool
    Pool,
}

impl FromStr for AllocatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "std" => Ok(AllocatorKind::Std),
            "pool" => Ok(AllocatorKind::Pool),
            _ => Err(Error::InvalidUsage(format!(
                "Invalid allocator: expected one of ['std', 'pool'], got {}",
                s
            ))),
        }
    }
}

/// Options for a route.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Allocator used when the route is not given one explicitly.
    ///
    /// Default: `AllocatorKind::Std`
    pub allocator: AllocatorKind,

    /// Maximum number of idle tickets kept by the pool allocator.
    ///
    /// Default: `128`
    pub pool_capacity: usize,

    /// Raise the completion signal even when the completion callback fails.
    ///
    /// With `false` a failed callback leaves the next ticket waiting until its
    /// own cancellation fires.
    ///
    /// Default: `false`
    pub signal_on_failure: bool,
}

impl Default for Opts {
    #[no_panic]
    fn default() -> Self {
        Self {
            allocator: AllocatorKind::Std,
            pool_capacity: POOL_CAPACITY,
            signal_on_failure: false,
        }
    }
}
