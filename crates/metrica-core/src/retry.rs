//! Fixed-schedule retry.
//!
//! `Backoff` holds an ordered list of sleep durations. An operation gets at
//! most `intervals.len() + 1` attempts; only errors the caller classifies as
//! retriable consume the schedule. Every attempt's error is kept and reported
//! together once the operation gives up.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Default schedule: 1s, 3s, 5s.
pub const DEFAULT_INTERVALS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(3),
    Duration::from_secs(5),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    intervals: Vec<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVALS.to_vec())
    }
}

impl Backoff {
    pub fn new(intervals: Vec<Duration>) -> Self {
        Self { intervals }
    }

    pub fn from_millis(intervals_ms: &[u64]) -> Self {
        Self::new(intervals_ms.iter().copied().map(Duration::from_millis).collect())
    }

    /// No retries: exactly one attempt.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }

    pub fn max_attempts(&self) -> usize {
        self.intervals.len() + 1
    }

    /// Run `op` until it succeeds, fails with a non-retriable error, or the
    /// schedule is exhausted.
    pub async fn run<T, E, F, Fut, R>(&self, mut op: F, is_retriable: R) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let mut errors = Vec::new();

        for attempt in 0..self.max_attempts() {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    let retriable = is_retriable(&e);
                    tracing::debug!(attempt = attempt + 1, retriable, error = %e, "attempt failed");
                    errors.push(e);

                    match self.intervals.get(attempt) {
                        Some(pause) if retriable => tokio::time::sleep(*pause).await,
                        _ => break,
                    }
                }
            }
        }

        Err(RetryError { errors })
    }
}

/// All errors collected across attempts, oldest first.
#[derive(Debug)]
pub struct RetryError<E> {
    pub errors: Vec<E>,
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> usize {
        self.errors.len()
    }

    /// The last attempt's error.
    pub fn last(&self) -> Option<&E> {
        self.errors.last()
    }

    pub fn into_last(self) -> Option<E> {
        self.errors.into_iter().last()
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed after {} attempt(s): ", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}
