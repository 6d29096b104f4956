//! The thread-pool collaborator.
//!
//! The scheduler only ever needs one operation from a pool: a
//! non-blocking attempt to hand off a job, which either succeeds or tells
//! the caller to treat the occurrence as dropped. [`TaskPool`] captures
//! exactly that. [`BoundedThreadPool`] is a concrete, bounded-capacity
//! implementation for callers (and tests) that don't want to bring their
//! own pool.

use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// A unit of work submitted to a [`TaskPool`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// What the scheduler demands of a thread pool: try to admit a job at a
/// given priority, without blocking. `Ok` means the pool accepted the
/// job; `Err` (pool refused, typically because it is saturated) means the
/// dispatcher must treat this occurrence as dropped.
pub trait TaskPool: Send + Sync {
    /// Attempt to enqueue `job`. Returns `true` if accepted, `false` if
    /// the pool refused admission (e.g. it is full). Must never block.
    fn try_submit(&self, job: Job, priority: i32) -> bool;
}

enum Message {
    Job(Job),
    Shutdown,
}

/// A fixed-size worker pool with a bounded, non-blocking admission queue.
///
/// Submission never blocks: if the queue already holds `capacity` jobs,
/// `try_submit` returns `false` immediately rather than waiting for a
/// worker to free up. This is what lets the scheduler's dispatcher treat
/// pool saturation as a drop instead of a stall.
pub struct BoundedThreadPool {
    sender: SyncSender<Message>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl BoundedThreadPool {
    /// `workers` is the number of dedicated worker threads; `capacity` is
    /// how many jobs may sit in the queue waiting for a free worker
    /// before submission starts failing.
    pub fn new(workers: usize, capacity: usize) -> Arc<BoundedThreadPool> {
        assert!(workers > 0, "thread pool needs at least one worker");
        let (sender, receiver) = sync_channel::<Message>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let receiver = Arc::clone(&receiver);
            handles.push(
                thread::Builder::new()
                    .name(format!("pool-worker-{id}"))
                    .spawn(move || loop {
                        let message = receiver.lock().unwrap().recv();
                        match message {
                            Ok(Message::Job(job)) => job(),
                            Ok(Message::Shutdown) | Err(_) => break,
                        }
                    })
                    .expect("failed to spawn pool worker thread"),
            );
        }

        Arc::new(BoundedThreadPool {
            sender,
            workers: Mutex::new(handles),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }
}

impl TaskPool for BoundedThreadPool {
    fn try_submit(&self, job: Job, _priority: i32) -> bool {
        match self.sender.try_send(Message::Job(job)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl Drop for BoundedThreadPool {
    fn drop(&mut self) {
        let workers = self.workers.lock().unwrap().len();
        for _ in 0..workers {
            // Best-effort: if the queue is full, workers will still drain
            // naturally once the sender disconnects.
            let _ = self.sender.send(Message::Shutdown);
        }
        for handle in self.workers.lock().unwrap().drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn accepts_jobs_up_to_capacity() {
        let pool = BoundedThreadPool::new(1, 1);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        assert!(pool.try_submit(
            Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }),
            0
        ));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn refuses_when_saturated() {
        // One worker, zero queue slots: a slow job occupies the worker,
        // and the very next submission has nowhere to sit.
        let pool = BoundedThreadPool::new(1, 0);
        // Give the worker a moment to park in recv() so the first
        // (rendezvous) submission has somewhere to land.
        thread::sleep(Duration::from_millis(20));
        assert!(pool.try_submit(
            Box::new(|| thread::sleep(Duration::from_millis(300))),
            0
        ));
        thread::sleep(Duration::from_millis(20));
        assert!(!pool.try_submit(Box::new(|| {}), 0));
    }

    #[test]
    fn drop_joins_workers_without_panicking() {
        let pool = BoundedThreadPool::new(4, 4);
        for _ in 0..4 {
            pool.try_submit(Box::new(|| thread::sleep(Duration::from_millis(10))), 0);
        }
        drop(pool);
    }
}
