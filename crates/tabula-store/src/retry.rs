// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Timeout and bounded-retry policy for remote store calls.
//!
//! Every remote call is bounded by [`RetryPolicy::timeout`]. Reads are retried
//! on transient failures up to [`RetryPolicy::max_retries`] times with linear
//! backoff. Mutations are attempted exactly once.

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tracing::warn;

use crate::{StoreError, StoreErrorKind, StoreOp};

/// Per-call timeout plus read retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Extra attempts allowed for reads.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Single attempt bounded by `timeout`.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Run `call`, retrying transient failures when `op` is a read.
    pub async fn run<T, F, Fut>(&self, op: StoreOp, table: &str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let budget = if op.is_read() { self.max_retries } else { 0 };
        let mut attempt = 0u32;
        loop {
            match self.bounded(op, table, call()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < budget => {
                    attempt += 1;
                    warn!(%op, table, attempt, ?err, "retrying store call");
                    time::sleep(self.backoff.saturating_mul(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn bounded<T, Fut>(&self, op: StoreOp, table: &str, fut: Fut) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::new(
                op,
                table,
                StoreErrorKind::Timeout(self.timeout),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 2,
            backoff: Duration::from_millis(1),
        }
    }

    fn transient(op: StoreOp) -> StoreError {
        StoreError::new(op, "p1.t2", StoreErrorKind::Transport("reset".into()))
    }

    #[tokio::test]
    async fn reads_retry_transient_failures_until_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run(StoreOp::List, "p1.t2", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient(StoreOp::List)) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reads_recover_after_a_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run(StoreOp::Columns, "p1.t2", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(transient(StoreOp::Columns))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn mutations_are_attempted_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run(StoreOp::Create, "p1.t2", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient(StoreOp::Create)) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hung_calls_time_out() {
        let policy = RetryPolicy::no_retry(Duration::from_millis(20));
        let result: Result<(), _> = policy
            .run(StoreOp::Delete, "p1.t2", || async {
                time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Timeout(Duration::from_millis(20)));
        assert_eq!(err.op, StoreOp::Delete);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run(StoreOp::List, "p1.t2", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(StoreError::not_found(StoreOp::List, "p1.t2")) }
            })
            .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
