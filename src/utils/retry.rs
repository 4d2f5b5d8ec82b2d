use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// What a single attempt decided.
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The operation reached a final answer; stop retrying.
    Done(T),
    /// The operation ran but the post-condition does not hold yet.
    Retry,
}

/// Bounded retry with a fixed pause between attempts (no jitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` up to `max_attempts` times.
    ///
    /// - `Ok(Attempt::Done(v))` ends the loop with `Ok(Some(v))`.
    /// - `Ok(Attempt::Retry)` and errors on non-final attempts pause and try again.
    /// - An error on the final attempt triggers `recheck`: if it returns a value,
    ///   that value wins over the error; otherwise the error is returned.
    ///
    /// Returns `Ok(None)` when every attempt asked for a retry.
    pub async fn run<T, E, Op, OpFut, Check, CheckFut>(
        &self,
        mut op: Op,
        recheck: Check,
    ) -> Result<Option<T>, E>
    where
        E: Display,
        Op: FnMut(u32) -> OpFut,
        OpFut: Future<Output = Result<Attempt<T>, E>>,
        Check: FnOnce() -> CheckFut,
        CheckFut: Future<Output = Option<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut recheck = Some(recheck);

        for attempt in 1..=attempts {
            match op(attempt).await {
                Ok(Attempt::Done(value)) => return Ok(Some(value)),
                Ok(Attempt::Retry) => {
                    tracing::debug!(attempt, attempts, "Post-condition not met yet, retrying");
                }
                Err(e) if attempt == attempts => {
                    tracing::warn!(attempt, attempts, "Final attempt failed: {}", e);
                    if let Some(check) = recheck.take() {
                        if let Some(value) = check().await {
                            tracing::info!("Re-check settled the outcome despite the error");
                            return Ok(Some(value));
                        }
                    }
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, "Attempt failed: {}", e);
                }
            }

            if attempt < attempts && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_done_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let res: Result<Option<&str>, String> = instant(3)
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Attempt::Done("ok")) }
                },
                || async { None },
            )
            .await;

        assert_eq!(res, Ok(Some("ok")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_done() {
        let res: Result<Option<u32>, String> = instant(3)
            .run(
                |attempt| async move {
                    if attempt < 3 {
                        Ok(Attempt::Retry)
                    } else {
                        Ok(Attempt::Done(attempt))
                    }
                },
                || async { None },
            )
            .await;

        assert_eq!(res, Ok(Some(3)));
    }

    #[tokio::test]
    async fn test_exhausted_returns_none() {
        let calls = AtomicU32::new(0);
        let res: Result<Option<()>, String> = instant(3)
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Attempt::Retry) }
                },
                || async { Some(()) },
            )
            .await;

        // recheck only runs after a final-attempt error
        assert_eq!(res, Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_error_then_success() {
        let res: Result<Option<&str>, String> = instant(3)
            .run(
                |attempt| async move {
                    if attempt == 1 {
                        Err("transient".to_string())
                    } else {
                        Ok(Attempt::Done("recovered"))
                    }
                },
                || async { None },
            )
            .await;

        assert_eq!(res, Ok(Some("recovered")));
    }

    #[tokio::test]
    async fn test_final_error_propagates_without_recheck_value() {
        let calls = AtomicU32::new(0);
        let res: Result<Option<()>, String> = instant(3)
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(format!("boom {}", attempt)) }
                },
                || async { None },
            )
            .await;

        assert_eq!(res, Err("boom 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_final_error_overridden_by_recheck() {
        let res: Result<Option<&str>, String> = instant(2)
            .run(
                |_| async { Err("confirm call failed".to_string()) },
                || async { Some("absent") },
            )
            .await;

        assert_eq!(res, Ok(Some("absent")));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<Option<()>, String> = instant(0)
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Attempt::Retry) }
                },
                || async { None },
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
