//! Units of work executed by a [`ThreadPool`](crate::ThreadPool).

use core::fmt;

/// A unit of work that can be sent to a worker thread
///
/// The pool calls [`execute`](Task::execute) exactly once for every task a
/// worker picks up. Tasks still queued when the pool is joined are never
/// executed; [`cancel`](Task::cancel) is called on them instead.
///
/// A panic inside either method is caught by the worker, which keeps running
/// and still hands the task back.
pub trait Task: Send + 'static {
    /// Run the task.
    fn execute(&mut self);

    /// Called instead of `execute` for a task that never ran.
    fn cancel(&mut self) {}
}

impl<T: Task + ?Sized> Task for Box<T> {
    fn execute(&mut self) {
        (**self).execute();
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }
}

/// Adapts a closure into a [`Task`]
///
/// ```rust
/// use msgq::{Task, TaskFn};
///
/// let mut hits = 0;
/// let mut task = TaskFn::new(move || hits += 1);
/// task.execute();
/// ```
pub struct TaskFn<F> {
    func: F,
}

impl<F> TaskFn<F>
where
    F: FnMut() + Send + 'static,
{
    /// Wrap `func`
    pub fn new(func: F) -> Self {
        Self { func }
    }

    /// Unwrap the closure
    pub fn into_inner(self) -> F {
        self.func
    }
}

impl<F> Task for TaskFn<F>
where
    F: FnMut() + Send + 'static,
{
    fn execute(&mut self) {
        (self.func)();
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").finish_non_exhaustive()
    }
}
