use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) | RetryError::AttemptsExceeded(e) => e,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// Preset tuned for object-store uploads. Batch writes overwrite by
    /// key, so repeating one is always safe.
    pub fn for_object_store(max_attempts: usize) -> Self {
        Self::new(max_attempts, Duration::from_millis(250), Duration::from_secs(5))
    }

    /// Zero-delay preset for tests.
    pub fn immediate(max_attempts: usize) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Executes the operation, retrying errors the classifier marks as
    /// transient until the attempt budget runs out.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }

                        let delay = self.backoff_delay(attempt);
                        sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let factor = 1u128 << attempt.min(6);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn transient_errors_are_retried_up_to_the_budget() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), RetryError<&str>> = RetryPolicy::immediate(3)
            .run(
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>("io") }
                },
                |_| RetryDisposition::Retry,
            )
            .await;

        assert!(matches!(result, Err(RetryError::AttemptsExceeded(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), RetryError<&str>> = RetryPolicy::immediate(5)
            .run(
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>("schema mismatch") }
                },
                |_| RetryDisposition::Stop,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_after_a_transient_failure_is_returned() {
        let attempts = AtomicUsize::new(0);
        let result = RetryPolicy::immediate(3)
            .run(
                || {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 { Err("io") } else { Ok(n) }
                    }
                },
                |_| RetryDisposition::Retry,
            )
            .await;

        assert!(matches!(result, Ok(1)));
    }
}
