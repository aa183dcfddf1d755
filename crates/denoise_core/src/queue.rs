//! Strictly serialized execution channel to the numeric backend.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::error::PipelineError;

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// A single logical worker that executes submitted closures one at a time, in
/// strict FIFO submission order, against worker-owned state `S`.
///
/// The backend carries process-lifetime mutable state and tolerates no
/// concurrent or reordered calls, so every backend call and every cache
/// mutation is funneled through one of these. The state is constructed on the
/// worker thread itself and never leaves it.
///
/// Shutdown drops queued-but-unstarted jobs (their handles resolve
/// `Interrupted`) and lets the in-flight job finish.
pub struct ExecutionQueue<S> {
    sender: Mutex<Option<Sender<Job<S>>>>,
    shutdown: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: 'static> ExecutionQueue<S> {
    /// Spawn the worker thread. `init` runs on the worker and builds the
    /// state that all submitted jobs will share.
    pub fn new<F>(init: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Job<S>>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let worker = thread::spawn(move || {
            let mut state = init();
            while let Ok(job) = receiver.recv() {
                if flag.load(Ordering::SeqCst) {
                    // Dropping the job drops its result sender, so the
                    // handle's wait resolves Interrupted.
                    continue;
                }
                job(&mut state);
            }
        });

        Self {
            sender: Mutex::new(Some(sender)),
            shutdown,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue a unit of work. Jobs submitted in order A then B execute in
    /// that order; there is no priority scheme and no preemption.
    pub fn submit<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::channel();
        let boxed: Job<S> = Box::new(move |state| {
            // The receiver may be gone if the caller discarded the handle.
            let _ = result_tx.send(job(state));
        });

        let accepted = match &*self.sender.lock().unwrap() {
            Some(sender) => sender.send(boxed).is_ok(),
            None => false,
        };
        if !accepted {
            debug!("job submitted after queue shutdown");
        }

        JobHandle { receiver: result_rx }
    }

}

impl<S> ExecutionQueue<S> {
    /// Stop accepting work, drop queued-but-unstarted jobs, let the job in
    /// progress finish, and join the worker thread.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.sender.lock().unwrap().take();
        if let Some(worker) = self.worker.lock().unwrap().take() {
            let _ = worker.join();
        }
    }
}

impl<S> Drop for ExecutionQueue<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Completion handle for one submitted job.
pub struct JobHandle<T> {
    receiver: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Block until the job has run. Resolves `Interrupted` if the queue shut
    /// down before the job started.
    pub fn wait(self) -> Result<T, PipelineError> {
        self.receiver.recv().map_err(|_| PipelineError::Interrupted)
    }

    /// Non-blocking poll. `None` while the job has not finished yet.
    pub fn try_wait(&self) -> Option<Result<T, PipelineError>> {
        match self.receiver.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PipelineError::Interrupted)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_jobs_run_in_submission_order() {
        let queue = ExecutionQueue::new(Vec::<u32>::new);

        for i in 0..10 {
            queue.submit(move |order: &mut Vec<u32>| order.push(i));
        }
        let order = queue.submit(|order: &mut Vec<u32>| order.clone()).wait().unwrap();

        assert_eq!(order, (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_effects_visible_before_next_job() {
        // A's effects must be observable when B starts.
        let queue = ExecutionQueue::new(|| 0u32);

        let a = queue.submit(|state: &mut u32| {
            *state = 42;
        });
        let b = queue.submit(|state: &mut u32| *state);

        a.wait().unwrap();
        assert_eq!(b.wait().unwrap(), 42);
    }

    #[test]
    fn test_result_delivery() {
        let queue = ExecutionQueue::new(|| ());
        let handle = queue.submit(|_| 7 * 6);
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn test_try_wait_polls() {
        let queue = ExecutionQueue::new(|| ());
        let (gate_tx, gate_rx) = channel::<()>();

        let handle = queue.submit(move |_| {
            gate_rx.recv().ok();
            5
        });

        assert!(handle.try_wait().is_none());
        gate_tx.send(()).unwrap();

        loop {
            if let Some(result) = handle.try_wait() {
                assert_eq!(result.unwrap(), 5);
                break;
            }
            thread::yield_now();
        }
    }

    #[test]
    fn test_shutdown_interrupts_queued_jobs() {
        let queue = Arc::new(ExecutionQueue::new(|| ()));
        let (gate_tx, gate_rx) = channel::<()>();
        let (started_tx, started_rx) = channel::<()>();

        // First job blocks until released; the second sits queued behind it.
        let in_flight = queue.submit(move |_| {
            started_tx.send(()).ok();
            gate_rx.recv().ok();
            1
        });
        let queued = queue.submit(|_| 2);

        started_rx.recv().unwrap();

        // Shut down from another thread while the first job is in flight.
        let q = Arc::clone(&queue);
        let closer = thread::spawn(move || q.shutdown());

        gate_tx.send(()).unwrap();
        closer.join().unwrap();

        // The in-flight job ran to completion; the queued one was dropped.
        assert_eq!(in_flight.wait().unwrap(), 1);
        assert_eq!(queued.wait(), Err(PipelineError::Interrupted));
    }

    #[test]
    fn test_submit_after_shutdown_is_interrupted() {
        let queue = ExecutionQueue::new(|| ());
        queue.shutdown();

        let handle = queue.submit(|_| 1);
        assert_eq!(handle.wait(), Err(PipelineError::Interrupted));
    }

    #[test]
    fn test_state_initialised_on_worker() {
        let queue = ExecutionQueue::new(|| String::from("worker-built"));
        let state = queue.submit(|s: &mut String| s.clone()).wait().unwrap();
        assert_eq!(state, "worker-built");
    }
}
