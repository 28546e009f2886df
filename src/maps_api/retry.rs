use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Duration,
}

/// Every attempt failed. `last` is `None` only when no attempt was allowed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: usize,
    pub last: Option<E>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Attempt 0 goes to the primary source, every later one to the backup.
    pub fn url_for_attempt<'a>(&self, attempt: usize, primary: &'a str, backup: &'a str) -> &'a str {
        if attempt == 0 {
            primary
        } else {
            backup
        }
    }

    /// Runs `op` until it succeeds or the attempts run out.
    ///
    /// `on_failure` sees every failed attempt (zero based). `sleep` is awaited
    /// between attempts only, never after the last one.
    pub async fn run<T, E, Op, OpFut, Sleep, SleepFut, OnFailure>(
        &self,
        mut op: Op,
        sleep: Sleep,
        mut on_failure: OnFailure,
    ) -> Result<T, Exhausted<E>>
    where
        Op: FnMut(usize) -> OpFut,
        OpFut: Future<Output = Result<T, E>>,
        Sleep: Fn(Duration) -> SleepFut,
        SleepFut: Future<Output = ()>,
        OnFailure: FnMut(usize, &E),
    {
        let mut last = None;
        for attempt in 0..self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    on_failure(attempt, &err);
                    last = Some(err);
                }
            }
            if attempt + 1 < self.max_attempts {
                sleep(self.backoff).await;
            }
        }
        Err(Exhausted {
            attempts: self.max_attempts,
            last,
        })
    }
}
