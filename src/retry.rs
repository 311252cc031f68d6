//! Bounded exponential-backoff retry for `VoxelService` I/O.

use std::time::Duration;

use crate::error::{BackendError, CoreError};

/// Abstracts "sleep for a duration" so retry timing is deterministically testable.
pub trait Sleeper {
    fn sleep(&self, d: Duration);
}

/// Sleeps for real; used in production.
pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Records requested durations without blocking; used in tests.
#[derive(Default)]
pub struct NoopSleeper {
    pub slept: std::sync::Mutex<Vec<Duration>>,
}

impl Sleeper for NoopSleeper {
    fn sleep(&self, d: Duration) {
        self.slept.lock().unwrap().push(d);
    }
}

/// Bounded exponential backoff: `base`, doubled each attempt, for up to `max_attempts`
/// total tries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Runs `op`, retrying only on `CoreError::Transient`, sleeping via `sleeper` between
    /// attempts with exponentially doubling delay. Non-transient errors propagate
    /// immediately. After `max_attempts` transient failures, the last error is returned.
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut() -> Result<T, BackendError>,
    ) -> Result<T, CoreError> {
        let mut attempt = 0u32;
        let mut delay = self.base;
        loop {
            attempt += 1;
            match op() {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(attempt, %e, "transient failure exhausted retry budget");
                        return Err(CoreError::Transient {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    tracing::debug!(attempt, ?delay, %e, "transient failure, retrying");
                    sleeper.sleep(delay);
                    delay *= 2;
                }
            }
        }
    }

    /// Runs `op`, retrying only when it fails with `CoreError::Transient`; every other
    /// `CoreError` variant propagates immediately on the first attempt. Mirrors `run`'s
    /// backoff schedule but operates directly on `CoreResult`-returning calls such as
    /// `VoxelService::get_subvolume` / `VoxelSink::write_subvolume`, which already produce
    /// `CoreError` rather than a raw `BackendError`.
    pub fn run_core<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut() -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut attempt = 0u32;
        let mut delay = self.base;
        loop {
            attempt += 1;
            match op() {
                Ok(v) => return Ok(v),
                Err(CoreError::Transient { source, .. }) => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(attempt, %source, "transient failure exhausted retry budget");
                        return Err(CoreError::Transient {
                            attempts: attempt,
                            source,
                        });
                    }
                    tracing::debug!(attempt, ?delay, %source, "transient failure, retrying");
                    sleeper.sleep(delay);
                    delay *= 2;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Msg;
    use std::cell::RefCell;

    #[test]
    fn succeeds_without_retry() {
        let sleeper = NoopSleeper::default();
        let policy = RetryPolicy::default();
        let result: Result<i32, CoreError> = policy.run(&sleeper, || Ok(42));
        assert_eq!(result.unwrap(), 42);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[test]
    fn retries_then_succeeds() {
        let sleeper = NoopSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 3,
            base: Duration::from_secs(1),
        };
        let calls = RefCell::new(0);
        let result: Result<i32, CoreError> = policy.run(&sleeper, || {
            *calls.borrow_mut() += 1;
            if *calls.borrow() < 3 {
                Err(Box::new(Msg::from("flaky")) as BackendError)
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(*calls.borrow(), 3);
        let slept = sleeper.slept.lock().unwrap();
        assert_eq!(slept.len(), 2);
        assert_eq!(slept[1], slept[0] * 2);
    }

    #[test]
    fn exhausts_attempts_and_returns_transient() {
        let sleeper = NoopSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 2,
            base: Duration::from_millis(1),
        };
        let result: Result<i32, CoreError> =
            policy.run(&sleeper, || Err(Box::new(Msg::from("down")) as BackendError));
        match result {
            Err(CoreError::Transient { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected Transient, got {other:?}"),
        }
    }

    #[test]
    fn run_core_retries_transient_then_succeeds() {
        let sleeper = NoopSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 3,
            base: Duration::from_secs(1),
        };
        let calls = RefCell::new(0);
        let result = policy.run_core(&sleeper, || {
            *calls.borrow_mut() += 1;
            if *calls.borrow() < 3 {
                Err(CoreError::Transient {
                    attempts: *calls.borrow(),
                    source: Box::new(Msg::from("flaky")) as BackendError,
                })
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(*calls.borrow(), 3);
        assert_eq!(sleeper.slept.lock().unwrap().len(), 2);
    }

    #[test]
    fn run_core_does_not_retry_non_transient_errors() {
        let sleeper = NoopSleeper::default();
        let policy = RetryPolicy::default();
        let calls = RefCell::new(0);
        let result: Result<i32, CoreError> = policy.run_core(&sleeper, || {
            *calls.borrow_mut() += 1;
            Err(CoreError::OutOfBounds("nope".into()))
        });
        match result {
            Err(CoreError::OutOfBounds(_)) => {}
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
        assert_eq!(*calls.borrow(), 1);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[test]
    fn run_core_exhausts_and_preserves_source() {
        let sleeper = NoopSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 2,
            base: Duration::from_millis(1),
        };
        let result: Result<i32, CoreError> = policy.run_core(&sleeper, || {
            Err(CoreError::Transient {
                attempts: 1,
                source: Box::new(Msg::from("down")) as BackendError,
            })
        });
        match result {
            Err(CoreError::Transient { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected Transient, got {other:?}"),
        }
    }
}
