use crate::metrics::Metrics;
use async_trait::async_trait;
use connectors::sql::base::{error::DbError, store::Store};
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, warn};

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
            RetryError::Fatal(err) | RetryError::AttemptsExceeded(err) => err,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_database()
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

    /// Preset for statements against the store.
    pub fn for_database() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Executes the operation with the configured retry policy.
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
            return Duration::from_millis(0);
        }

        let factor = 1u128 << attempt.min(6);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}

/// Runs one statement on behalf of the staging flow.
///
/// This is the seam where retry behaviour is injected: the flow hands over a
/// re-invocable operation and the runner decides how often to call it.
#[async_trait]
pub trait StatementRunner: Send + Sync {
    async fn run_statement<F, Fut>(&self, op: F) -> Result<u64, DbError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<u64, DbError>> + Send;

    /// Whether a failed statement may be re-run. Statements of runners that
    /// never retry skip the per-statement savepoint.
    fn retries(&self) -> bool {
        true
    }
}

/// Runs every statement exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

#[async_trait]
impl StatementRunner for NoRetry {
    async fn run_statement<F, Fut>(&self, mut op: F) -> Result<u64, DbError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<u64, DbError>> + Send,
    {
        op().await
    }

    fn retries(&self) -> bool {
        false
    }
}

/// Retries statements under a `RetryPolicy`, asking `classify` which errors
/// are transient.
#[derive(Clone)]
pub struct ClassifiedRetry<C> {
    policy: RetryPolicy,
    classify: C,
    metrics: Option<Metrics>,
}

impl<C> ClassifiedRetry<C>
where
    C: Fn(&DbError) -> RetryDisposition + Send + Sync,
{
    pub fn new(policy: RetryPolicy, classify: C) -> Self {
        Self {
            policy,
            classify,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<C> StatementRunner for ClassifiedRetry<C>
where
    C: Fn(&DbError) -> RetryDisposition + Send + Sync,
{
    async fn run_statement<F, Fut>(&self, mut op: F) -> Result<u64, DbError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<u64, DbError>> + Send,
    {
        let metrics = self.metrics.as_ref();
        let mut attempts = 0usize;

        let counted = move || {
            if attempts > 0 {
                debug!(attempt = attempts + 1, "Retrying statement");
                if let Some(metrics) = metrics {
                    metrics.increment_retries(1);
                }
            }
            attempts += 1;
            op()
        };

        self.policy
            .run(counted, |err| (self.classify)(err))
            .await
            .map_err(|err| {
                if let RetryError::AttemptsExceeded(inner) = &err {
                    warn!(error = %inner, "Statement retries exhausted");
                }
                err.into_inner()
            })
    }
}

/// Executes `sql` through `runner`. Retrying runners get the statement
/// wrapped in a savepoint so a failed attempt leaves the transaction usable.
pub async fn execute_statement<S, R>(store: &S, runner: &R, sql: &str) -> Result<u64, DbError>
where
    S: Store,
    R: StatementRunner,
{
    debug!(sql, "Running statement");
    if runner.retries() {
        runner.run_statement(|| store.execute_atomic(sql)).await
    } else {
        runner.run_statement(|| store.execute(sql)).await
    }
}
