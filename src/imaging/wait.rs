//! Bounded waits for work that may never finish.
//!
//! Decoding untrusted bytes is the only place a conversion can stall. The job
//! runs on a worker thread and the caller polls for its outcome in short
//! slices, so it always regains control by the deadline or as soon as the
//! [`CancelToken`] fires.
//!
//! A job that outlives its wait is parked in the caller's [`DecodeWorker`].
//! At most one job runs per worker: the next wait gives the parked job the
//! rest of its own deadline to finish and ends in [`WaitOutcome::Busy`] if it
//! is still running. Stalled decodes therefore never pile up threads or
//! input copies.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Poll interval used while waiting on a job.
const POLL_SLICE: Duration = Duration::from_millis(20);

/// Default bound on a single decode.
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Cooperative cancellation flag shared between a caller and a waiting call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long to wait, and whether the caller can abort early.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub cancel: Option<CancelToken>,
}

impl WaitPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DECODE_TIMEOUT)
    }
}

/// Every way a bounded wait can end.
#[derive(Debug)]
pub enum WaitOutcome<T, E> {
    Ready(T),
    Failed(E),
    TimedOut,
    Cancelled,
    /// The worker died without reporting (a panicking decoder).
    Crashed,
    /// An earlier job on the same worker was still running at the deadline.
    Busy,
}

/// Slot for the one decode thread a caller may have running.
#[derive(Debug, Default)]
pub struct DecodeWorker {
    parked: Option<JoinHandle<()>>,
}

impl DecodeWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a job that outlived its wait is still running.
    pub fn is_busy(&self) -> bool {
        self.parked.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Join the parked job if it has finished. Returns true when idle.
    fn reap(&mut self) -> bool {
        match self.parked.take() {
            Some(handle) if handle.is_finished() => {
                // A panic was already reported as `Crashed`, or nobody waited.
                let _ = handle.join();
                true
            }
            Some(handle) => {
                self.parked = Some(handle);
                false
            }
            None => true,
        }
    }
}

/// Run `job` on a worker thread and wait for it under `policy`.
///
/// `worker` holds the thread if the wait gives up on it.
pub fn wait_bounded<T, E, F>(
    policy: &WaitPolicy,
    worker: &mut DecodeWorker,
    job: F,
) -> WaitOutcome<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    if policy.cancelled() {
        return WaitOutcome::Cancelled;
    }

    let deadline = Instant::now() + policy.timeout;
    while !worker.reap() {
        if policy.cancelled() {
            return WaitOutcome::Cancelled;
        }
        let now = Instant::now();
        if now >= deadline {
            log::warn!("previous decode is still running");
            return WaitOutcome::Busy;
        }
        std::thread::sleep(POLL_SLICE.min(deadline - now));
    }

    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("image-decode".into())
        .spawn(move || {
            // The receiver is gone if the caller stopped waiting.
            let _ = tx.send(job());
        });
    let handle = match spawned {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("could not start decode worker: {e}");
            return WaitOutcome::Crashed;
        }
    };

    let outcome = receive(&rx, policy, deadline);
    match outcome {
        WaitOutcome::TimedOut | WaitOutcome::Cancelled => worker.parked = Some(handle),
        _ => {
            let _ = handle.join();
        }
    }
    outcome
}

fn receive<T, E>(
    rx: &Receiver<Result<T, E>>,
    policy: &WaitPolicy,
    deadline: Instant,
) -> WaitOutcome<T, E> {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::TimedOut;
        }
        match rx.recv_timeout(POLL_SLICE.min(deadline - now)) {
            Ok(Ok(value)) => return WaitOutcome::Ready(value),
            Ok(Err(err)) => return WaitOutcome::Failed(err),
            Err(RecvTimeoutError::Timeout) => {
                if policy.cancelled() {
                    return WaitOutcome::Cancelled;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return WaitOutcome::Crashed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_value_is_returned() {
        let outcome: WaitOutcome<u32, String> =
            wait_bounded(&WaitPolicy::default(), &mut DecodeWorker::new(), || Ok(7));
        assert!(matches!(outcome, WaitOutcome::Ready(7)));
    }

    #[test]
    fn job_error_is_returned() {
        let outcome: WaitOutcome<u32, String> =
            wait_bounded(&WaitPolicy::default(), &mut DecodeWorker::new(), || {
                Err("bad bytes".to_string())
            });
        assert!(matches!(outcome, WaitOutcome::Failed(e) if e == "bad bytes"));
    }

    #[test]
    fn stalled_job_times_out() {
        let policy = WaitPolicy::new(Duration::from_millis(50));
        let started = Instant::now();
        let outcome: WaitOutcome<(), String> =
            wait_bounded(&policy, &mut DecodeWorker::new(), || {
                std::thread::sleep(Duration::from_secs(5));
                Ok(())
            });
        assert!(matches!(outcome, WaitOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn cancel_stops_the_wait() {
        let token = CancelToken::new();
        let policy = WaitPolicy::new(Duration::from_secs(30)).with_cancel(token.clone());
        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(40));
                token.cancel();
            })
        };
        let started = Instant::now();
        let outcome: WaitOutcome<(), String> =
            wait_bounded(&policy, &mut DecodeWorker::new(), || {
                std::thread::sleep(Duration::from_secs(5));
                Ok(())
            });
        canceller.join().unwrap();
        assert!(matches!(outcome, WaitOutcome::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn already_cancelled_token_skips_the_job() {
        let token = CancelToken::new();
        token.cancel();
        let policy = WaitPolicy::default().with_cancel(token);
        let outcome: WaitOutcome<(), String> =
            wait_bounded(&policy, &mut DecodeWorker::new(), || panic!("job must not run"));
        assert!(matches!(outcome, WaitOutcome::Cancelled));
    }

    #[test]
    fn panicking_job_does_not_hang() {
        let policy = WaitPolicy::new(Duration::from_secs(5));
        let outcome: WaitOutcome<(), String> =
            wait_bounded(&policy, &mut DecodeWorker::new(), || panic!("decoder bug"));
        assert!(matches!(outcome, WaitOutcome::Crashed));
    }

    #[test]
    fn timed_out_job_is_parked_and_blocks_the_next_wait() {
        let mut worker = DecodeWorker::new();
        let policy = WaitPolicy::new(Duration::from_millis(30));
        let outcome: WaitOutcome<(), String> = wait_bounded(&policy, &mut worker, || {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        });
        assert!(matches!(outcome, WaitOutcome::TimedOut));
        assert!(worker.is_busy());

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let outcome: WaitOutcome<(), String> = wait_bounded(&policy, &mut worker, move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        assert!(matches!(outcome, WaitOutcome::Busy));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn next_wait_runs_once_parked_job_finishes() {
        let mut worker = DecodeWorker::new();
        let outcome: WaitOutcome<(), String> =
            wait_bounded(&WaitPolicy::new(Duration::from_millis(20)), &mut worker, || {
                std::thread::sleep(Duration::from_millis(150));
                Ok(())
            });
        assert!(matches!(outcome, WaitOutcome::TimedOut));

        let outcome: WaitOutcome<u8, String> =
            wait_bounded(&WaitPolicy::new(Duration::from_secs(5)), &mut worker, || Ok(3));
        assert!(matches!(outcome, WaitOutcome::Ready(3)));
        assert!(!worker.is_busy());
    }

    #[test]
    fn finished_job_leaves_worker_idle() {
        let mut worker = DecodeWorker::new();
        let outcome: WaitOutcome<u8, String> =
            wait_bounded(&WaitPolicy::default(), &mut worker, || Ok(1));
        assert!(matches!(outcome, WaitOutcome::Ready(1)));
        assert!(!worker.is_busy());
    }
}
