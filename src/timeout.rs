//! Wall-clock timeout wrapper for worker tasks, turning a hang into a `Transient` error.

use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::error::{CoreError, Msg};

/// Runs `op` on a detached thread, racing it against `timeout`. If `op` has not produced a
/// result by the deadline, returns `CoreError::Transient` immediately without waiting for
/// the spawned thread; it keeps running to completion and its (now-unused) result is
/// dropped when it eventually sends on the disconnected channel.
pub fn run_with_timeout<T: Send + 'static>(
    timeout: Duration,
    op: impl FnOnce() -> T + Send + 'static,
) -> Result<T, CoreError> {
    let (tx, rx) = bounded(1);
    std::thread::spawn(move || {
        let result = op();
        let _ = tx.send(result);
    });
    match rx.recv_timeout(timeout) {
        Ok(v) => Ok(v),
        Err(RecvTimeoutError::Timeout) => Err(CoreError::Transient {
            attempts: 1,
            source: Box::new(Msg::from("worker task timed out")),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(CoreError::Transient {
            attempts: 1,
            source: Box::new(Msg::from("worker task panicked")),
        }),
    }
}
