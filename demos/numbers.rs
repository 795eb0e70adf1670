//! Example: process numbers in parallel, emit them in input order.
//!
//! Every number is handled by its own task with a different delay, so the
//! processing order is scrambled. The route puts the output back in input
//! order.
//!
//! Usage:
//!   cargo run --example numbers

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use flightorder::tokio::Route;

#[tokio::main]
async fn main() -> flightorder::Result<()> {
    let input: Vec<u64> = (1..=9).collect();
    let (processed, output) = process_input(&input).await?;

    println!("input:     {:?}", input);
    println!("processed: {:?}", processed);
    println!("output:    {:?}", output);
    Ok(())
}

async fn process_input(input: &[u64]) -> flightorder::Result<(Vec<u64>, Vec<u64>)> {
    let route = Arc::new(Route::new());
    let cancel = CancellationToken::new();
    let processed = Arc::new(Mutex::new(Vec::new()));
    let output = Arc::new(Mutex::new(Vec::new()));

    let mut tasks = Vec::with_capacity(input.len());
    for &v in input {
        let mut ticket = route.take_ticket().await;
        let route = Arc::clone(&route);
        let cancel = cancel.clone();
        let processed = Arc::clone(&processed);
        let output = Arc::clone(&output);
        tasks.push(tokio::spawn(async move {
            // Pseudo-random work time
            tokio::time::sleep(Duration::from_millis((v * 37) % 100)).await;
            processed.lock().expect("poisoned").push(v);

            route
                .complete_ticket_with(&cancel, &mut ticket, || async {
                    output.lock().expect("poisoned").push(v);
                    Ok::<_, flightorder::Error>(())
                })
                .await
        }));
    }

    for task in tasks {
        task.await.expect("task panicked")?;
    }

    let processed = processed.lock().expect("poisoned").clone();
    let output = output.lock().expect("poisoned").clone();
    Ok((processed, output))
}
