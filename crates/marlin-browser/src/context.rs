//! Execution-context marshaling.
//!
//! All tree mutation and event dispatch happens inside "the document's
//! execution context". Background fetch completions are posted here
//! instead of touching the document from their worker thread directly.
//! The dispatcher is caller-provided: a no-op immediate dispatcher for
//! single-threaded embedding, or a real queue the host pumps.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A unit of work bound for the document's execution context.
pub type Job = Box<dyn FnOnce() + Send>;

/// Dispatcher for work that must run in the document's execution context.
pub trait ExecutionContext: Send + Sync {
    /// Submit `job`. Whether it runs inline or later is the
    /// implementation's choice; it must run exactly once.
    fn post(&self, job: Job);
}

/// Runs every job inline on the posting thread.
///
/// The right choice for single-threaded embedding and for tests that
/// want completions applied as soon as they happen. With this context a
/// background load's completion mutates the document from the worker
/// thread; the engine's internal locking keeps that safe.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateContext;

impl ImmediateContext {
    /// Create the context.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ExecutionContext for ImmediateContext {
    fn post(&self, job: Job) {
        job();
    }
}

/// A real work queue for multi-threaded hosts.
///
/// Background threads post jobs; the owning thread pumps them with
/// [`QueuedContext::run_pending`] or [`QueuedContext::wait_and_run_one`],
/// so every job runs on the pumping thread.
#[derive(Default)]
pub struct QueuedContext {
    queue: Mutex<VecDeque<Job>>,
    arrived: Condvar,
}

impl QueuedContext {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs currently queued.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Whether no jobs are queued.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Run every queued job, including jobs posted while draining.
    /// Returns the number of jobs run.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.queue.lock().unwrap().pop_front();
            match job {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Block until a job arrives (or `timeout` passes) and run it.
    /// Returns whether a job ran.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    pub fn wait_and_run_one(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock().unwrap();
        loop {
            if let Some(job) = queue.pop_front() {
                drop(queue);
                job();
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, result) = self.arrived.wait_timeout(queue, deadline - now).unwrap();
            queue = guard;
            if result.timed_out() && queue.is_empty() {
                return false;
            }
        }
    }
}

impl ExecutionContext for QueuedContext {
    fn post(&self, job: Job) {
        self.queue.lock().unwrap().push_back(job);
        self.arrived.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn immediate_context_runs_inline() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        ImmediateContext::new().post(Box::new(move || {
            let _ = c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queued_context_defers_until_pumped() {
        let context = QueuedContext::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        context.post(Box::new(move || {
            let _ = c.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(context.run_pending(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wait_and_run_one_times_out_when_idle() {
        let context = QueuedContext::new();
        assert!(!context.wait_and_run_one(Duration::from_millis(10)));
    }
}
