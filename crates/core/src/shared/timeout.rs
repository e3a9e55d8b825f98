use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

/// How long a cancelled worker gets to notice its flag and exit.
const CANCEL_GRACE: Duration = Duration::from_secs(10);

/// Set when the caller stops waiting; long-running jobs poll it and bail out.
pub type CancelFlag = Arc<AtomicBool>;

/// Outcome of a job run under a deadline.
#[derive(Debug, PartialEq)]
pub enum Deadline<T> {
    Completed(T),
    TimedOut,
    /// The worker thread panicked or could not be spawned.
    Abandoned,
}

/// Runs `job` on a worker thread and waits at most `timeout` for its result.
///
/// On timeout the job's [`CancelFlag`] is raised and the worker is given
/// [`CANCEL_GRACE`] to wind down; its late result is discarded.
pub fn run_with_timeout<T, F>(name: &str, timeout: Duration, job: F) -> Deadline<T>
where
    T: Send + 'static,
    F: FnOnce(CancelFlag) -> T + Send + 'static,
{
    let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
    let (tx, rx) = bounded(1);
    let worker_cancel = cancel.clone();
    let spawned = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _ = tx.send(job(worker_cancel));
        });

    if let Err(e) = spawned {
        log::warn!("Failed to spawn {name} worker: {e}");
        return Deadline::Abandoned;
    }

    match rx.recv_timeout(timeout) {
        Ok(value) => Deadline::Completed(value),
        Err(RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(CANCEL_GRACE) {
                log::warn!("{name} worker still running after cancellation");
            }
            Deadline::TimedOut
        }
        Err(RecvTimeoutError::Disconnected) => Deadline::Abandoned,
    }
}
