//! Request/response pipeline over two bounded queues
//!
//! Worker threads pull requests from an input queue, answer on an output
//! queue, and exit once the input queue is cancelled.
//!
//! Run with `RUST_LOG=msgq=debug cargo run --example pipeline` to see the
//! queue's own events.

use msgq::BoundedBlockingQueue;
use std::sync::Arc;
use std::thread;
use tracing::info;

const NUM_WORKERS: usize = 10;
const NUM_MESSAGES: usize = 1000;
const QUEUE_CAPACITY: usize = 100;

fn main() {
    tracing_subscriber::fmt()
        .with_thread_names(true)
        .without_time()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let requests = Arc::new(BoundedBlockingQueue::with_capacity(QUEUE_CAPACITY));
    let responses = Arc::new(BoundedBlockingQueue::with_capacity(QUEUE_CAPACITY));

    let workers: Vec<_> = (0..NUM_WORKERS)
        .map(|id| {
            let requests = Arc::clone(&requests);
            let responses = Arc::clone(&responses);
            thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    let mut handled = 0;
                    while let Ok((_, message)) = requests.pop(true) {
                        let mut response = format!("Response to '{}' from {}", message, id);
                        while let Err(err) = responses.push(response) {
                            response = err.into_inner();
                            thread::yield_now();
                        }
                        handled += 1;
                    }
                    info!(handled, "worker done");
                })
                .expect("failed to spawn worker")
        })
        .collect();

    let mut sent = 0;
    let mut received = 0;
    while sent < NUM_MESSAGES || received < NUM_MESSAGES {
        if sent < NUM_MESSAGES {
            match requests.push(format!("Message {}", sent)) {
                Ok(len) => {
                    sent += 1;
                    if len < QUEUE_CAPACITY / 2 {
                        continue;
                    }
                }
                Err(_) => thread::yield_now(),
            }
        }

        if received < NUM_MESSAGES {
            if let Ok((_, response)) = responses.pop(sent == NUM_MESSAGES) {
                info!(
                    queued_in = requests.len(),
                    queued_out = responses.len(),
                    "{}",
                    response
                );
                received += 1;
            }
        }
    }

    requests.cancel();
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    info!(sent, received, "pipeline finished");
}
