//! Fixed-size thread pool fed by a [`BoundedBlockingQueue`].
//!
//! ```text
//!            push                 pop(true)            push               pop
//! caller ----------> input queue ----------> worker ----------> output queue ----------> caller
//!                    (bounded)               execute()           (unbounded)
//! ```
//!
//! Cancelling the pool cancels the input queue. Workers finish the task in
//! hand and exit. The last one out moves the tasks nobody picked up to the
//! output queue, after their [`Task::cancel`] hook has run, and then cancels
//! the output queue so that blocked callers of [`ThreadPool::pop`] return.
//!
//! A task that panics is caught by its worker; the worker keeps going and
//! the task is still handed back.

use std::io;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, debug_span, warn};

use crate::queue::BoundedBlockingQueue;
use crate::task::Task;
use crate::{Error, PushError, Result};

const DEFAULT_THREAD_NAME: &str = "msgq-worker";

/// Thread pool configuration
///
/// # Examples
///
/// ```rust
/// use msgq::{PoolConfig, TaskFn, ThreadPool};
///
/// let mut pool: ThreadPool<TaskFn<fn()>> = PoolConfig::new()
///     .workers(2)
///     .task_capacity(16)
///     .thread_name("doc-worker")
///     .build()
///     .unwrap();
///
/// fn noop() {}
/// pool.push(TaskFn::new(noop as fn())).unwrap();
/// let (_, _task) = pool.pop(true).unwrap();
/// pool.join();
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    workers: usize,
    task_capacity: usize,
    thread_name: String,
    stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            task_capacity: usize::MAX,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
        }
    }
}

impl PoolConfig {
    /// One worker per available CPU, unbounded task queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker threads
    ///
    /// # Panics
    ///
    /// Panics if `workers` is 0
    pub fn workers(mut self, workers: usize) -> Self {
        assert!(workers > 0, "Thread pool needs at least one worker");
        self.workers = workers;
        self
    }

    /// Maximum number of tasks waiting for a worker
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0
    pub fn task_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Queue capacity must be greater than 0");
        self.task_capacity = capacity;
        self
    }

    /// Prefix for worker thread names; workers are named `{prefix}-{index}`
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Stack size for worker threads, in bytes
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Spawn the workers
    ///
    /// Fails only if a thread cannot be spawned; workers already started are
    /// shut down before the error is returned.
    pub fn build<T: Task>(&self) -> io::Result<ThreadPool<T>> {
        ThreadPool::spawn(self)
    }
}

/// A fixed set of worker threads executing [`Task`]s in FIFO order
///
/// Finished tasks are handed back through [`pop`](Self::pop), so results
/// stored inside a task travel back to the caller with it.
pub struct ThreadPool<T: Task> {
    input: Arc<BoundedBlockingQueue<T>>,
    output: Arc<BoundedBlockingQueue<T>>,
    live: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Task> ThreadPool<T> {
    /// Start `workers` threads behind a queue of at most `task_capacity` tasks
    ///
    /// # Panics
    ///
    /// Panics if either argument is 0
    pub fn new(workers: usize, task_capacity: usize) -> io::Result<Self> {
        PoolConfig::new()
            .workers(workers)
            .task_capacity(task_capacity)
            .build()
    }

    fn spawn(config: &PoolConfig) -> io::Result<Self> {
        let mut pool = Self {
            input: Arc::new(BoundedBlockingQueue::with_capacity(config.task_capacity)),
            output: Arc::new(BoundedBlockingQueue::new()),
            live: Arc::new(AtomicUsize::new(0)),
            workers: Vec::with_capacity(config.workers),
        };

        for id in 0..config.workers {
            let mut builder = thread::Builder::new().name(format!("{}-{}", config.thread_name, id));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let input = Arc::clone(&pool.input);
            let output = Arc::clone(&pool.output);
            let live = Arc::clone(&pool.live);
            // No worker can exit before the input queue is cancelled, so the
            // count cannot reach zero while spawning.
            pool.live.fetch_add(1, Ordering::AcqRel);
            match builder.spawn(move || run_worker(id, &input, &output, &live)) {
                Ok(handle) => pool.workers.push(handle),
                Err(err) => {
                    pool.live.fetch_sub(1, Ordering::AcqRel);
                    // Dropping `pool` joins the workers spawned so far.
                    return Err(err);
                }
            }
        }

        debug!(
            workers = config.workers,
            task_capacity = config.task_capacity,
            "thread pool started"
        );
        Ok(pool)
    }

    /// Queue a task for execution
    ///
    /// Returns the number of tasks waiting for a worker after the insertion,
    /// or hands the task back if the queue is full or the pool cancelled.
    pub fn push(&self, task: T) -> core::result::Result<usize, PushError<T>> {
        self.input.push(task)
    }

    /// Take a finished task
    ///
    /// Returns the number of finished tasks before the extraction.
    ///
    /// A blocking call waits only while some worker is still running. Once
    /// the pool has been cancelled and every worker has exited, the
    /// remaining tasks are handed out and then `Err(Error::Cancelled)` is
    /// returned. A non-blocking call on an empty output returns
    /// `Err(Error::Empty)` while workers run and `Err(Error::Cancelled)`
    /// after they are gone.
    pub fn pop(&self, blocking: bool) -> Result<(usize, T)> {
        match self.output.pop(blocking) {
            // Blocking pops on a cancelled queue fail before looking at the
            // items, so drain them here.
            Err(Error::Cancelled) if blocking => self.output.pop(false),
            popped => popped,
        }
    }

    /// Stop accepting tasks and let workers exit after their current task
    ///
    /// Does not wait for the workers; see [`join`](Self::join).
    pub fn cancel(&self) {
        self.input.cancel();
    }

    /// Returns `true` once the pool has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.input.is_cancelled()
    }

    /// Cancel the pool and wait for every worker
    ///
    /// On return every task the pool ever accepted is in the output queue:
    /// executed, or never started and passed through its [`Task::cancel`]
    /// hook, in their original order. Calling `join` again is a no-op.
    pub fn join(&mut self) {
        self.cancel();

        let workers = self.workers.len();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }

        if workers > 0 {
            debug!(workers, completed = self.output.len(), "thread pool joined");
        }
    }

    /// Tasks waiting for a worker
    pub fn pending(&self) -> usize {
        self.input.len()
    }

    /// Finished tasks waiting to be popped
    pub fn completed(&self) -> usize {
        self.output.len()
    }

    /// Worker threads not yet joined
    pub fn workers(&self) -> usize {
        self.workers.len()
    }
}

impl<T: Task> Drop for ThreadPool<T> {
    fn drop(&mut self) {
        self.join();
    }
}

impl<T: Task> core::fmt::Debug for ThreadPool<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

fn run_worker<T: Task>(
    id: usize,
    input: &BoundedBlockingQueue<T>,
    output: &BoundedBlockingQueue<T>,
    live: &AtomicUsize,
) {
    let _span = debug_span!("worker", id).entered();
    debug!("worker started");

    let mut executed = 0u64;
    let mut panicked = 0u64;
    while let Ok((_, mut task)) = input.pop(true) {
        if panic::catch_unwind(AssertUnwindSafe(|| task.execute())).is_err() {
            panicked += 1;
            warn!("task panicked");
        }
        executed += 1;
        hand_back(output, task);
    }

    debug!(executed, panicked, "worker exiting");

    if live.fetch_sub(1, Ordering::AcqRel) == 1 {
        recover_unstarted(input, output);
    }
}

/// Runs on the last worker out; every other worker has left its loop.
fn recover_unstarted<T: Task>(input: &BoundedBlockingQueue<T>, output: &BoundedBlockingQueue<T>) {
    let mut recovered = 0usize;
    while let Ok((_, mut task)) = input.pop(false) {
        if panic::catch_unwind(AssertUnwindSafe(|| task.cancel())).is_err() {
            warn!("task panicked while cancelled");
        }
        recovered += 1;
        hand_back(output, task);
    }

    debug!(recovered, "recovered unstarted tasks");
    output.cancel();
}

fn hand_back<T: Task>(output: &BoundedBlockingQueue<T>, task: T) {
    if let Err(err) = output.push(task) {
        warn!(error = %err, "dropping finished task");
    }
}
