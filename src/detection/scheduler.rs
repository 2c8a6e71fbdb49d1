// src/detection/scheduler.rs
//! Fixed-period analysis driver with synchronous cancellation

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
    thread_id: ThreadId,
}

/// Runs a task on a dedicated thread every `period`
///
/// Deadlines are fixed-rate; after an overrun the next deadline restarts from
/// the current instant instead of firing a burst of catch-up ticks. Once
/// [`stop`](Self::stop) returns the task will not run again.
pub struct Scheduler {
    worker: Option<Worker>,
    period: Duration,
    ticks: Arc<AtomicU64>,
}

impl Scheduler {
    /// Spawn the worker thread. The first tick happens one period after start.
    pub fn start<F>(name: &str, period: Duration, mut task: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let ticks = Arc::new(AtomicU64::new(0));
        let worker_ticks = ticks.clone();

        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!(?period, "scheduler started");
            let mut next_deadline = Instant::now() + period;

            loop {
                let wait = next_deadline.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                task();
                worker_ticks.fetch_add(1, Ordering::Relaxed);

                next_deadline += period;
                let now = Instant::now();
                if next_deadline <= now {
                    warn!(?period, behind = ?(now - next_deadline), "analysis tick overran its period");
                    next_deadline = now + period;
                }
            }
            debug!("scheduler stopped");
        })?;

        let thread_id = handle.thread().id();
        Ok(Self {
            worker: Some(Worker { stop_tx, handle, thread_id }),
            period,
            ticks,
        })
    }

    /// Cancel the worker and wait for it to exit.
    ///
    /// Called from inside the task itself, this only signals cancellation; the
    /// tick in progress is the last one.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        drop(worker.stop_tx);

        if thread::current().id() == worker.thread_id {
            return;
        }
        if worker.handle.join().is_err() {
            warn!("scheduler thread panicked");
        }
    }

    /// False once stopped
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .field("ticks", &self.ticks())
            .finish()
    }
}
