//! Integration tests for msgq
//!
//! These exercise the queue and the thread pool together through the public
//! API only.

use crossbeam::channel;
use msgq::{BoundedBlockingQueue, Error, PoolConfig, Task, TaskFn, ThreadPool};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn test_request_response_pipeline() {
    // Workers read requests from one bounded queue and answer on another,
    // retrying while the response queue is full.
    const NUM_WORKERS: usize = 10;
    const NUM_MESSAGES: usize = 1000;
    const QUEUE_CAPACITY: usize = 100;

    let requests = Arc::new(BoundedBlockingQueue::with_capacity(QUEUE_CAPACITY));
    let responses = Arc::new(BoundedBlockingQueue::with_capacity(QUEUE_CAPACITY));

    let workers: Vec<_> = (0..NUM_WORKERS)
        .map(|id| {
            let requests = Arc::clone(&requests);
            let responses = Arc::clone(&responses);
            thread::spawn(move || {
                while let Ok((_, message)) = requests.pop(true) {
                    let mut response = format!("Response to '{}' from {}", message, id);
                    while let Err(err) = responses.push(response) {
                        response = err.into_inner();
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let mut sent = 0;
    let mut received = Vec::with_capacity(NUM_MESSAGES);
    while sent < NUM_MESSAGES || received.len() < NUM_MESSAGES {
        if sent < NUM_MESSAGES {
            match requests.push(format!("Message {}", sent)) {
                Ok(len) if len < QUEUE_CAPACITY / 2 => {
                    sent += 1;
                    continue;
                }
                Ok(_) => sent += 1,
                Err(err) => assert!(err.is_full()),
            }
        }

        if received.len() < NUM_MESSAGES {
            match responses.pop(sent == NUM_MESSAGES) {
                Ok((_, response)) => received.push(response),
                Err(err) => assert_eq!(err, Error::Empty),
            }
        }
    }

    requests.cancel();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(received.len(), NUM_MESSAGES);
    for i in 0..NUM_MESSAGES {
        let needle = format!("'Message {}'", i);
        assert_eq!(
            received.iter().filter(|r| r.contains(&needle)).count(),
            1,
            "message {} answered more or less than once",
            i
        );
    }
}

struct Tracked {
    id: usize,
    executed: bool,
    cancelled: bool,
    gate: Option<(channel::Sender<()>, channel::Receiver<()>)>,
}

impl Tracked {
    fn new(id: usize) -> Self {
        Self {
            id,
            executed: false,
            cancelled: false,
            gate: None,
        }
    }
}

impl Task for Tracked {
    fn execute(&mut self) {
        if let Some((started, release)) = self.gate.take() {
            started.send(()).unwrap();
            release.recv().unwrap();
        }
        self.executed = true;
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

#[test]
fn test_join_recovers_unstarted_tasks() {
    let mut pool = PoolConfig::new().workers(1).task_capacity(16).build().unwrap();

    let (started_tx, started_rx) = channel::bounded(1);
    let (release_tx, release_rx) = channel::bounded(1);
    let mut blocker = Tracked::new(0);
    blocker.gate = Some((started_tx, release_rx));
    pool.push(blocker).unwrap();

    // The only worker is now stuck inside task 0.
    started_rx.recv_timeout(TIMEOUT).unwrap();
    for id in 1..=5 {
        pool.push(Tracked::new(id)).unwrap();
    }
    assert_eq!(pool.pending(), 5);

    pool.cancel();
    release_tx.send(()).unwrap();
    pool.join();

    assert_eq!(pool.workers(), 0);
    assert_eq!(pool.completed(), 6);

    let (_, first) = pool.pop(false).unwrap();
    assert_eq!(first.id, 0);
    assert!(first.executed && !first.cancelled);

    for id in 1..=5 {
        let (_, task) = pool.pop(false).unwrap();
        assert_eq!(task.id, id);
        assert!(!task.executed);
        assert!(task.cancelled);
    }
    assert_eq!(pool.pop(false).err(), Some(Error::Cancelled));
}

#[test]
fn test_drop_waits_for_running_task() {
    let (started_tx, started_rx) = channel::bounded(1);
    let (release_tx, release_rx) = channel::bounded::<()>(1);
    let (dropped_tx, dropped_rx) = channel::bounded(1);
    let executed = Arc::new(AtomicBool::new(false));

    let pool = ThreadPool::new(1, 4).unwrap();
    pool.push(TaskFn::new({
        let executed = Arc::clone(&executed);
        move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            executed.store(true, Ordering::SeqCst);
        }
    }))
    .unwrap();
    started_rx.recv_timeout(TIMEOUT).unwrap();

    let dropper = thread::spawn(move || {
        drop(pool);
        dropped_tx.send(()).unwrap();
    });

    // The only worker is parked inside the task, so the drop cannot finish.
    assert!(dropped_rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert!(!executed.load(Ordering::SeqCst));

    release_tx.send(()).unwrap();
    dropped_rx.recv_timeout(TIMEOUT).unwrap();
    assert!(executed.load(Ordering::SeqCst));
    dropper.join().unwrap();
}

#[test]
fn test_heterogeneous_tasks() {
    let mut pool: ThreadPool<Box<dyn Task>> = ThreadPool::new(2, 8).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    pool.push(Box::new(Tracked::new(1))).unwrap();
    pool.push(Box::new(TaskFn::new({
        let counter = Arc::clone(&counter);
        move || {
            counter.fetch_add(10, Ordering::SeqCst);
        }
    })))
    .unwrap();

    for _ in 0..2 {
        pool.pop(true).unwrap();
    }
    pool.join();
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn test_estimate_pi() {
    struct Sample {
        x: f64,
        y: f64,
        inside: Option<bool>,
    }

    impl Task for Sample {
        fn execute(&mut self) {
            self.inside = Some(self.x * self.x + self.y * self.y <= 1.0);
        }
    }

    const SAMPLES: usize = 20_000;
    let mut pool = PoolConfig::new().workers(4).task_capacity(256).build().unwrap();
    let mut rng = fastrand::Rng::with_seed(7);

    let mut pushed = 0;
    let mut inside = 0;
    let mut collected = 0;
    while collected < SAMPLES {
        while pushed < SAMPLES {
            let sample = Sample {
                x: rng.f64(),
                y: rng.f64(),
                inside: None,
            };
            match pool.push(sample) {
                Ok(_) => pushed += 1,
                Err(_) => break,
            }
        }
        let (_, sample) = pool.pop(true).unwrap();
        if sample.inside == Some(true) {
            inside += 1;
        }
        collected += 1;
    }
    pool.join();

    let estimate = 4.0 * inside as f64 / SAMPLES as f64;
    assert!((estimate - std::f64::consts::PI).abs() < 0.1, "estimate {}", estimate);
}
