//! Example: three tickets completed from three threads out of order.
//!
//! Each thread finishes at a different time, but the "completed" lines always
//! come out as task 1, task 2, task 3.
//!
//! Usage:
//!   cargo run --example basic

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flightorder::sync::{Context, Route};

fn main() -> flightorder::Result<()> {
    let route = Arc::new(Route::new());

    // Take tickets in the order results must be committed
    let tickets = [
        (1, route.take_ticket(), 20),
        (2, route.take_ticket(), 30),
        (3, route.take_ticket(), 10),
    ];

    let handles: Vec<_> = tickets
        .into_iter()
        .map(|(task, mut ticket, delay_ms)| {
            let route = Arc::clone(&route);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(delay_ms));
                println!("Task {} started", task);
                route.complete_ticket_with(&Context::background(), &mut ticket, || {
                    println!("Task {} completed", task);
                    Ok::<_, flightorder::Error>(())
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("task panicked")?;
    }
    Ok(())
}
