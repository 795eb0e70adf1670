//! Tests for the blocking route.
//!
//! ## Test Matrix
//!
//! ### Ordering
//! - `test_one_ticket` - Single ticket completes at once and is released
//! - `test_two_tickets_in_order` - Completion in issuance order
//! - `test_three_tickets_reverse` - Completion requested t3, t2, t1
//! - `test_three_tickets_mixed` - Completion requested t2, t3, t1
//! - `test_many_tickets_any_order` - Callbacks never overlap and keep order
//!
//! ### Cancellation
//! - `test_canceled_before_predecessor` - Canceled wait is retryable
//! - `test_cancel_while_waiting` - Cancel handle wakes a blocked wait
//!
//! ### Callback failures
//! - `test_failed_callback_blocks_successor` - Default policy withholds the signal
//! - `test_failed_callback_signal_policy` - `signal_on_failure` unblocks the successor
//! - `test_failed_tail_callback` - Tail failure still releases the ticket
//!
//! ### Allocators
//! - `test_pool_allocator_many_rounds` - Pooled tickets cycle through the route

#![cfg(feature = "sync")]

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flightorder::sync::{BlockingSignal, Context, Route, Ticket};
use flightorder::{AllocatorKind, Error, Opts, PoolAllocator};

use common::{CallLog, CallbackError, RecordingAllocator};

fn recording_route(opts: Opts) -> (Arc<Route>, Arc<RecordingAllocator>) {
    let alloc = Arc::new(RecordingAllocator::default());
    let route = Route::with_allocator(opts, Arc::clone(&alloc) as _);
    (Arc::new(route), alloc)
}

/// Complete `ticket` on a new thread after `delay`, logging the callback.
fn complete_later(
    route: &Arc<Route>,
    log: &Arc<CallLog>,
    mut ticket: Ticket,
    delay: Duration,
) -> thread::JoinHandle<()> {
    let route = Arc::clone(route);
    let log = Arc::clone(log);
    thread::spawn(move || {
        thread::sleep(delay);
        let seq = ticket.seq();
        route
            .complete_ticket_with(&Context::background(), &mut ticket, || {
                log.enter(seq);
                thread::sleep(Duration::from_millis(1));
                log.exit();
                Ok::<_, Error>(())
            })
            .unwrap();
    })
}

// === Ordering ===

#[test]
fn test_one_ticket() {
    let (route, alloc) = recording_route(Opts::default());
    let mut t1 = route.take_ticket();
    let mut calls = 0;
    route
        .complete_ticket_with(&Context::background(), &mut t1, || {
            calls += 1;
            Ok::<_, Error>(())
        })
        .unwrap();
    assert_eq!(calls, 1);
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0]);
}

#[test]
fn test_two_tickets_in_order() {
    let (route, alloc) = recording_route(Opts::default());
    let mut t1 = route.take_ticket();
    let mut t2 = route.take_ticket();
    route.complete_ticket(&Context::background(), &mut t1).unwrap();
    route.complete_ticket(&Context::background(), &mut t2).unwrap();
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0, 1]);
}

#[test]
fn test_three_tickets_reverse() {
    let (route, alloc) = recording_route(Opts::default());
    let log = Arc::new(CallLog::default());

    let t1 = route.take_ticket();
    let t2 = route.take_ticket();
    let t3 = route.take_ticket();

    let handles = [
        complete_later(&route, &log, t3, Duration::from_millis(10)),
        complete_later(&route, &log, t2, Duration::from_millis(20)),
        complete_later(&route, &log, t1, Duration::from_millis(30)),
    ];
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(log.order(), vec![0, 1, 2]);
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0, 1, 2]);
}

#[test]
fn test_three_tickets_mixed() {
    let (route, alloc) = recording_route(Opts::default());
    let log = Arc::new(CallLog::default());

    let t1 = route.take_ticket();
    let t2 = route.take_ticket();
    let t3 = route.take_ticket();

    let handles = [
        complete_later(&route, &log, t2, Duration::from_millis(10)),
        complete_later(&route, &log, t3, Duration::from_millis(20)),
        complete_later(&route, &log, t1, Duration::from_millis(30)),
    ];
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(log.order(), vec![0, 1, 2]);
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0, 1, 2]);
}

#[test]
fn test_many_tickets_any_order() {
    const N: u64 = 64;
    let (route, alloc) = recording_route(Opts::default());
    let log = Arc::new(CallLog::default());

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let ticket = route.take_ticket();
            // Later tickets tend to finish first.
            let delay = Duration::from_millis((N - i) % 7 + (i * 13) % 5);
            complete_later(&route, &log, ticket, delay)
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let expected: Vec<u64> = (0..N).collect();
    assert_eq!(log.order(), expected);
    assert_eq!(alloc.released(), expected);
    assert!(route.is_idle());
}

// === Cancellation ===

#[test]
fn test_canceled_before_predecessor() {
    let (route, alloc) = recording_route(Opts::default());
    let mut t1 = route.take_ticket();
    let mut t2 = route.take_ticket();

    let (canceled, handle) = Context::background().with_cancel();
    handle.cancel();

    let mut ran = false;
    let err = route
        .complete_ticket_with(&canceled, &mut t2, || {
            ran = true;
            Ok::<_, Error>(())
        })
        .unwrap_err();
    assert_eq!(err, Error::Canceled);
    assert!(err.is_wait_canceled());
    assert!(!ran);
    assert!(!t2.is_spent());
    assert!(alloc.released().is_empty());
    assert_eq!(route.tail_seq(), Some(1));

    route.complete_ticket(&Context::background(), &mut t1).unwrap();
    route.complete_ticket(&Context::background(), &mut t2).unwrap();
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0, 1]);
}

#[test]
fn test_cancel_while_waiting() {
    let route = Arc::new(Route::new());
    let mut t1 = route.take_ticket();
    let mut t2 = route.take_ticket();

    let (ctx, handle) = Context::background().with_cancel();
    let waiter = {
        let route = Arc::clone(&route);
        thread::spawn(move || {
            let result = route.complete_ticket(&ctx, &mut t2);
            (result, t2)
        })
    };
    thread::sleep(Duration::from_millis(20));
    handle.cancel();

    let (result, mut t2) = waiter.join().unwrap();
    assert_eq!(result, Err(Error::Canceled));

    route.complete_ticket(&Context::background(), &mut t1).unwrap();
    route.complete_ticket(&Context::background(), &mut t2).unwrap();
    assert!(route.is_idle());
}

// === Callback failures ===

#[test]
fn test_failed_callback_blocks_successor() {
    let (route, alloc) = recording_route(Opts::default());
    let mut t1 = route.take_ticket();
    let mut t2 = route.take_ticket();

    let err = route
        .complete_ticket_with(&Context::background(), &mut t1, || {
            Err::<(), _>(CallbackError::Failed(0))
        })
        .unwrap_err();
    assert_eq!(err, CallbackError::Failed(0));
    assert!(t1.is_spent());

    let ctx = Context::background().with_timeout(Duration::from_millis(30));
    let mut ran = false;
    let err = route
        .complete_ticket_with(&ctx, &mut t2, || {
            ran = true;
            Ok::<_, CallbackError>(())
        })
        .unwrap_err();
    assert_eq!(err, CallbackError::Route(Error::DeadlineExceeded));
    assert!(!ran);
    assert!(alloc.released().is_empty());
}

#[test]
fn test_failed_callback_signal_policy() {
    let (route, alloc) = recording_route(Opts {
        signal_on_failure: true,
        ..Opts::default()
    });
    let mut t1 = route.take_ticket();
    let mut t2 = route.take_ticket();

    let err = route
        .complete_ticket_with(&Context::background(), &mut t1, || {
            Err::<(), _>(CallbackError::Failed(0))
        })
        .unwrap_err();
    assert_eq!(err, CallbackError::Failed(0));

    let ctx = Context::background().with_timeout(Duration::from_secs(5));
    route
        .complete_ticket_with(&ctx, &mut t2, || Ok::<_, CallbackError>(()))
        .unwrap();
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0, 1]);
}

#[test]
fn test_failed_tail_callback() {
    let (route, alloc) = recording_route(Opts::default());
    let mut t1 = route.take_ticket();
    let err = route
        .complete_ticket_with(&Context::background(), &mut t1, || {
            Err::<(), _>(CallbackError::Failed(0))
        })
        .unwrap_err();
    assert_eq!(err, CallbackError::Failed(0));
    assert!(route.is_idle());
    assert_eq!(alloc.released(), vec![0]);

    // The route keeps working after the failure.
    let mut t2 = route.take_ticket();
    assert_eq!(t2.seq(), 1);
    route.complete_ticket(&Context::background(), &mut t2).unwrap();
}

// === Allocators ===

#[test]
fn test_pool_allocator_many_rounds() {
    let pool = Arc::new(PoolAllocator::<BlockingSignal>::new(4));
    let route = Arc::new(Route::with_allocator(Opts::default(), Arc::clone(&pool) as _));
    let log = Arc::new(CallLog::default());

    for round in 0..5u64 {
        let handles: Vec<_> = (0..3u64)
            .map(|i| {
                let ticket = route.take_ticket();
                complete_later(&route, &log, ticket, Duration::from_millis(3 * (3 - i)))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(route.is_idle());
        assert_eq!(pool.idle(), 3, "round {}", round);
    }

    let expected: Vec<u64> = (0..15).collect();
    assert_eq!(log.order(), expected);
}

#[test]
fn test_pool_allocator_from_opts() {
    let route = Route::with_opts(Opts {
        allocator: AllocatorKind::Pool,
        pool_capacity: 2,
        ..Opts::default()
    });
    let mut t1 = route.take_ticket();
    let mut t2 = route.take_ticket();
    let expired = Context::background().with_timeout(Duration::ZERO);
    assert_eq!(
        route.complete_ticket(&expired, &mut t2),
        Err(Error::DeadlineExceeded)
    );
    route.complete_ticket(&Context::background(), &mut t1).unwrap();
    route.complete_ticket(&Context::background(), &mut t2).unwrap();
    assert!(route.is_idle());
}
