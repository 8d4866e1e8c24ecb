//! Single-threaded deferred task queue.
//!
//! An [`EventLoop`] holds closures posted for later execution. Nothing runs
//! at post time: tasks execute in FIFO order when the owner turns the loop
//! with [`EventLoop::process_pending`] or [`EventLoop::run_until_idle`].
//!
//! Each call to `process_pending` is one turn. It runs only the tasks that
//! were already queued when the turn started, so a task that posts another
//! task never sees it run within the same turn.
//!
//! # Example
//!
//! ```
//! use cashpoint_core::EventLoop;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let event_loop = EventLoop::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = hits.clone();
//! event_loop.post(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! }).unwrap();
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 0);
//! assert_eq!(event_loop.process_pending(), 1);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::EventLoopError;
use crate::logging::targets;

/// A unique identifier for a posted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

struct LoopState {
    tasks: Mutex<VecDeque<TaskData>>,
    running: AtomicBool,
}

/// A handle to a deferred task queue.
///
/// Cloning the handle is cheap; all clones share the same queue.
#[derive(Clone)]
pub struct EventLoop {
    state: Arc<LoopState>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending", &self.pending_count())
            .field("running", &self.is_running())
            .finish()
    }
}

impl EventLoop {
    /// Create a new, empty event loop.
    pub fn new() -> Self {
        Self {
            state: Arc::new(LoopState {
                tasks: Mutex::new(VecDeque::new()),
                running: AtomicBool::new(true),
            }),
        }
    }

    /// Post a task to run on a later turn of the loop.
    ///
    /// Fails with [`EventLoopError::Stopped`] once [`quit`](Self::quit) has
    /// been called.
    pub fn post<F>(&self, task: F) -> Result<TaskId, EventLoopError>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return Err(EventLoopError::Stopped);
        }

        let id = next_task_id();
        self.state.tasks.lock().push_back(TaskData {
            id,
            task: Box::new(task),
        });
        tracing::trace!(target: targets::EVENT_LOOP, task = id.as_u64(), "task posted");
        Ok(id)
    }

    /// Run one turn: every task that was pending when the call started.
    ///
    /// Tasks posted while the turn is running stay queued for the next turn.
    /// Returns the number of tasks executed.
    pub fn process_pending(&self) -> usize {
        let batch = self.state.tasks.lock().len();
        let mut executed = 0;

        for _ in 0..batch {
            // The lock is released before the task runs so it can post.
            let next = self.state.tasks.lock().pop_front();
            let Some(task_data) = next else {
                break;
            };
            tracing::trace!(
                target: targets::EVENT_LOOP,
                task = task_data.id.as_u64(),
                "running task"
            );
            (task_data.task)();
            executed += 1;
        }

        executed
    }

    /// Turn the loop until no tasks remain.
    ///
    /// Returns the total number of tasks executed.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let executed = self.process_pending();
            if executed == 0 {
                return total;
            }
            total += executed;
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.state.tasks.lock().is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.state.tasks.lock().len()
    }

    /// Stop accepting new tasks.
    ///
    /// Tasks that are already queued still run when the loop is turned.
    pub fn quit(&self) {
        if self.state.running.swap(false, Ordering::SeqCst) {
            tracing::debug!(
                target: targets::EVENT_LOOP,
                pending = self.pending_count(),
                "event loop quit requested"
            );
        }
    }

    /// Returns `false` once [`quit`](Self::quit) has been called.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Returns `true` if both handles refer to the same queue.
    pub fn same_loop(&self, other: &EventLoop) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_does_not_run_immediately() {
        let event_loop = EventLoop::new();
        let ran = Arc::new(AtomicBool::new(false));

        let ran_clone = ran.clone();
        event_loop
            .post(move || ran_clone.store(true, Ordering::SeqCst))
            .unwrap();

        assert!(!ran.load(Ordering::SeqCst));
        assert!(event_loop.has_pending());
        assert_eq!(event_loop.process_pending(), 1);
        assert!(ran.load(Ordering::SeqCst));
        assert!(!event_loop.has_pending());
    }

    #[test]
    fn test_fifo_order() {
        let event_loop = EventLoop::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            event_loop.post(move || order.lock().push(i)).unwrap();
        }

        assert_eq!(event_loop.pending_count(), 5);
        event_loop.process_pending();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_nested_post_runs_next_turn() {
        let event_loop = EventLoop::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner_loop = event_loop.clone();
        let outer_order = order.clone();
        event_loop
            .post(move || {
                outer_order.lock().push("outer");
                let inner_order = outer_order.clone();
                inner_loop
                    .post(move || inner_order.lock().push("inner"))
                    .unwrap();
            })
            .unwrap();

        assert_eq!(event_loop.process_pending(), 1);
        assert_eq!(*order.lock(), vec!["outer"]);
        assert_eq!(event_loop.pending_count(), 1);

        assert_eq!(event_loop.process_pending(), 1);
        assert_eq!(*order.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_run_until_idle_drains_chains() {
        let event_loop = EventLoop::new();
        let count = Arc::new(Mutex::new(0));

        let l1 = event_loop.clone();
        let c1 = count.clone();
        event_loop
            .post(move || {
                *c1.lock() += 1;
                let c2 = c1.clone();
                l1.post(move || *c2.lock() += 1).unwrap();
            })
            .unwrap();

        assert_eq!(event_loop.run_until_idle(), 2);
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_quit_rejects_new_tasks() {
        let event_loop = EventLoop::new();
        event_loop.post(|| {}).unwrap();
        event_loop.quit();

        assert!(!event_loop.is_running());
        assert_eq!(event_loop.post(|| {}), Err(EventLoopError::Stopped));
        // Already queued work still runs.
        assert_eq!(event_loop.process_pending(), 1);
    }

    #[test]
    fn test_task_ids_are_unique() {
        let event_loop = EventLoop::new();
        let a = event_loop.post(|| {}).unwrap();
        let b = event_loop.post(|| {}).unwrap();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_clones_share_queue() {
        let event_loop = EventLoop::new();
        let other = event_loop.clone();
        other.post(|| {}).unwrap();

        assert!(event_loop.same_loop(&other));
        assert!(!event_loop.same_loop(&EventLoop::new()));
        assert_eq!(event_loop.pending_count(), 1);
    }
}
