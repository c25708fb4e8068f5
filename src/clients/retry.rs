//! Bounded retry with exponential backoff.
//!
//! [`RetryExecutor`] runs one logical request as up to `max_retries + 1`
//! attempts. After each attempt the outcome is classified by [`classify`]:
//!
//! - **Retryable**: transport timeout, connection failure, a transport abort
//!   the caller did not ask for, or a `408` / `5xx` response
//! - **Terminal**: any other `4xx` response, or any other transport failure
//! - **None**: a `1xx`/`2xx`/`3xx` response
//!
//! Only retryable outcomes are retried. Before retry `k` (1-indexed) the
//! executor reports a [`RetryEvent`] to its [`RetryObserver`] and then waits
//! `exponent^k` backoff units. When the retries run out, the last outcome is
//! returned unchanged.
//!
//! Caller cancellation through a [`CancellationToken`] is never retried. It
//! aborts the in-flight attempt or the pending backoff wait immediately.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::clients::errors::{HttpError, TransportError};
use crate::clients::http_response::HttpResponse;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff exponent.
pub const DEFAULT_RETRY_EXPONENT: u32 = 2;

/// Default backoff unit; delays are `exponent^k` of these.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Retry ceiling and backoff schedule.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use resilient_http::clients::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_for(3), Duration::from_secs(8));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    exponent: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the default one-second backoff unit.
    #[must_use]
    pub const fn new(max_retries: u32, exponent: u32) -> Self {
        Self {
            max_retries,
            exponent,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    /// Replaces the backoff unit.
    #[must_use]
    pub const fn with_backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the backoff exponent.
    #[must_use]
    pub const fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Returns the backoff unit.
    #[must_use]
    pub const fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Returns the total number of attempts, first attempt included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns the wait before retry `attempt` (1-indexed): `exponent^attempt`
    /// backoff units, saturating on overflow. No jitter is applied.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.exponent.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_EXPONENT)
    }
}

/// Classification of an attempt's outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// The attempt did not fail.
    None,
    /// The attempt failed in a way that waiting and retrying may fix.
    Retryable,
    /// The attempt failed in a way that retrying will not fix.
    Terminal,
}

/// Returns `true` for `408 Request Timeout` and every `5xx` status.
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    status == 408 || (status >= 500 && status <= 599)
}

/// Classifies a response status.
#[must_use]
pub const fn classify_status(status: u16) -> FailureClass {
    if is_retryable_status(status) {
        FailureClass::Retryable
    } else if status >= 400 {
        FailureClass::Terminal
    } else {
        FailureClass::None
    }
}

/// Classifies a transport failure.
#[must_use]
pub const fn classify_error(error: &TransportError) -> FailureClass {
    match error {
        TransportError::Timeout { .. }
        | TransportError::Connect { .. }
        | TransportError::Aborted { .. } => FailureClass::Retryable,
        TransportError::Request { .. } | TransportError::Body { .. } => FailureClass::Terminal,
    }
}

/// Classifies the outcome of one attempt.
#[must_use]
pub fn classify(outcome: &Result<HttpResponse, TransportError>) -> FailureClass {
    match outcome {
        Ok(response) => classify_status(response.status),
        Err(error) => classify_error(error),
    }
}

/// Per-call retry state. Owned by one logical call and dropped with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryContext {
    /// Retries performed so far. Never exceeds the policy's `max_retries`.
    pub attempt: u32,
    /// Classification of the most recent attempt.
    pub last_failure: FailureClass,
    /// Wait before the next attempt, once one is scheduled.
    pub next_delay: Option<Duration>,
}

impl RetryContext {
    /// Creates a context for a call that has not been attempted yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attempt: 0,
            last_failure: FailureClass::None,
            next_delay: None,
        }
    }
}

impl Default for RetryContext {
    fn default() -> Self {
        Self::new()
    }
}

/// What triggered a retry.
#[derive(Clone, Copy, Debug)]
pub enum RetryCause<'a> {
    /// The transport failed.
    Failure(&'a TransportError),
    /// The server answered with a retryable status.
    Status(u16),
}

impl fmt::Display for RetryCause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure(error) => write!(f, "{error}"),
            Self::Status(status) => write!(f, "status {status}"),
        }
    }
}

/// A retry about to happen, as reported to a [`RetryObserver`].
#[derive(Clone, Copy, Debug)]
pub struct RetryEvent<'a> {
    /// The retry number, starting at 1.
    pub attempt: u32,
    /// The outcome that triggered the retry.
    pub cause: RetryCause<'a>,
    /// The request's target URI.
    pub uri: &'a Url,
    /// How long the executor will wait before retrying.
    pub delay: Duration,
}

/// Diagnostic sink notified once per retry, before the backoff wait.
///
/// Observers run synchronously on the calling task. A panicking observer is
/// logged and ignored; it never changes the outcome of the request.
///
/// Any `Fn(&RetryEvent<'_>) + Send + Sync` closure is an observer.
pub trait RetryObserver: Send + Sync {
    /// Called before each retry wait.
    fn on_retry(&self, event: &RetryEvent<'_>);
}

impl<F> RetryObserver for F
where
    F: Fn(&RetryEvent<'_>) + Send + Sync,
{
    fn on_retry(&self, event: &RetryEvent<'_>) {
        self(event);
    }
}

/// An observer that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn on_retry(&self, _event: &RetryEvent<'_>) {}
}

/// An observer that logs every retry at error level through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, event: &RetryEvent<'_>) {
        match event.cause {
            RetryCause::Failure(error) => tracing::error!(
                error = %error,
                "An exception occurred on retry {} to {}",
                event.attempt,
                event.uri
            ),
            RetryCause::Status(status) => tracing::error!(
                "A non-success code {} was received on retry {} to {}",
                status,
                event.attempt,
                event.uri
            ),
        }
    }
}

/// Drives attempts of one logical request under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    observer: Arc<dyn RetryObserver>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Creates an executor reporting retries to `observer`.
    #[must_use]
    pub fn new(policy: RetryPolicy, observer: Arc<dyn RetryObserver>) -> Self {
        Self { policy, observer }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `attempt` until it yields a non-retryable outcome or the retries
    /// run out, waiting between attempts per the policy.
    ///
    /// `uri` is only used for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Cancelled`] as soon as `cancel` fires, and
    /// [`HttpError::Transport`] with the last transport failure if the final
    /// attempt failed at the transport level. Responses of any status are
    /// returned as `Ok`.
    pub async fn execute<F, Fut>(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<HttpResponse, HttpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, TransportError>>,
    {
        let mut context = RetryContext::new();

        loop {
            if cancel.is_cancelled() {
                return Err(HttpError::Cancelled);
            }

            tracing::debug!("Sending attempt {} to {}", context.attempt + 1, uri);
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(HttpError::Cancelled),
                outcome = attempt() => outcome,
            };

            context.last_failure = classify(&outcome);
            if context.last_failure != FailureClass::Retryable
                || context.attempt >= self.policy.max_retries
            {
                return outcome.map_err(HttpError::from);
            }

            context.attempt += 1;
            let delay = self.policy.delay_for(context.attempt);
            context.next_delay = Some(delay);

            let cause = match &outcome {
                Ok(response) => RetryCause::Status(response.status),
                Err(error) => RetryCause::Failure(error),
            };
            self.notify(&RetryEvent {
                attempt: context.attempt,
                cause,
                uri,
                delay,
            });
            drop(outcome);

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(HttpError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn notify(&self, event: &RetryEvent<'_>) {
        let observer = &self.observer;
        if panic::catch_unwind(AssertUnwindSafe(|| observer.on_retry(event))).is_err() {
            tracing::warn!(
                "Retry observer panicked on retry {} to {}; continuing",
                event.attempt,
                event.uri
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn uri() -> Url {
        Url::parse("https://example.com/resource").unwrap()
    }

    fn status(code: u16) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(code, HashMap::new(), ""))
    }

    fn timeout() -> Result<HttpResponse, TransportError> {
        Err(TransportError::Timeout {
            uri: "https://example.com/resource".to_string(),
        })
    }

    fn counting_observer() -> (Arc<AtomicU32>, Arc<dyn RetryObserver>) {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let observer: Arc<dyn RetryObserver> = Arc::new(move |_: &RetryEvent<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, observer)
    }

    #[test]
    fn test_default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.exponent(), 2);
        assert_eq!(policy.backoff_unit(), Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_delay_is_exponent_to_the_attempt() {
        let policy = RetryPolicy::new(5, 2);
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));

        let policy = RetryPolicy::new(3, 3).with_backoff_unit(Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(90));
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(100, 10);
        assert_eq!(
            policy.delay_for(40),
            Duration::from_secs(1).saturating_mul(u32::MAX)
        );
    }

    #[test]
    fn test_zero_exponent_gives_zero_delay() {
        let policy = RetryPolicy::new(3, 0);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(200), FailureClass::None);
        assert_eq!(classify_status(302), FailureClass::None);
        assert_eq!(classify_status(408), FailureClass::Retryable);
        assert_eq!(classify_status(500), FailureClass::Retryable);
        assert_eq!(classify_status(503), FailureClass::Retryable);
        assert_eq!(classify_status(599), FailureClass::Retryable);
        assert_eq!(classify_status(400), FailureClass::Terminal);
        assert_eq!(classify_status(404), FailureClass::Terminal);
        assert_eq!(classify_status(429), FailureClass::Terminal);
    }

    #[test]
    fn test_error_classification() {
        let uri = "https://example.com".to_string();
        assert_eq!(
            classify_error(&TransportError::Timeout { uri: uri.clone() }),
            FailureClass::Retryable
        );
        assert_eq!(
            classify_error(&TransportError::Connect {
                uri: uri.clone(),
                reason: "reset".to_string()
            }),
            FailureClass::Retryable
        );
        assert_eq!(
            classify_error(&TransportError::Aborted { uri: uri.clone() }),
            FailureClass::Retryable
        );
        assert_eq!(
            classify_error(&TransportError::Request {
                uri,
                reason: "too many redirects".to_string()
            }),
            FailureClass::Terminal
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_three_503s_with_growing_delays() {
        let (count, observer) = counting_observer();
        let executor = RetryExecutor::new(RetryPolicy::new(3, 2), observer);

        let mut script = VecDeque::from([503, 503, 503, 200]);
        let mut sent_at = Vec::new();
        let result = executor
            .execute(&uri(), &CancellationToken::new(), || {
                sent_at.push(Instant::now());
                let code = script.pop_front().unwrap();
                async move { status(code) }
            })
            .await;

        assert_eq!(result.unwrap().status, 200);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        let gaps: Vec<Duration> = sent_at.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_ceiling_plus_one_then_returns_last_failure() {
        for ceiling in 0..=4 {
            let executor = RetryExecutor::new(RetryPolicy::new(ceiling, 2), Arc::new(NoopObserver));
            let mut attempts = 0;
            let result = executor
                .execute(&uri(), &CancellationToken::new(), || {
                    attempts += 1;
                    async { timeout() }
                })
                .await;

            assert_eq!(attempts, ceiling + 1);
            assert!(matches!(
                result,
                Err(HttpError::Transport(TransportError::Timeout { .. }))
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retryable_status_is_returned_as_response() {
        let executor = RetryExecutor::new(RetryPolicy::new(2, 2), Arc::new(NoopObserver));
        let mut attempts = 0;
        let response = executor
            .execute(&uri(), &CancellationToken::new(), || {
                attempts += 1;
                async { status(502) }
            })
            .await
            .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(response.status, 502);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_status_is_not_retried() {
        let (count, observer) = counting_observer();
        let executor = RetryExecutor::new(RetryPolicy::default(), observer);
        let mut attempts = 0;
        let response = executor
            .execute(&uri(), &CancellationToken::new(), || {
                attempts += 1;
                async { status(404) }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(attempts, 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_transport_error_is_not_retried() {
        let executor = RetryExecutor::new(RetryPolicy::default(), Arc::new(NoopObserver));
        let mut attempts = 0;
        let result = executor
            .execute(&uri(), &CancellationToken::new(), || {
                attempts += 1;
                async {
                    Err(TransportError::Request {
                        uri: "https://example.com/resource".to_string(),
                        reason: "redirect loop".to_string(),
                    })
                }
            })
            .await;

        assert_eq!(attempts, 1);
        assert!(matches!(
            result,
            Err(HttpError::Transport(TransportError::Request { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_attempt_cause_and_uri() {
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer = move |event: &RetryEvent<'_>| {
            sink.lock()
                .unwrap()
                .push((event.attempt, event.cause.to_string(), event.uri.to_string(), event.delay));
        };
        let executor = RetryExecutor::new(RetryPolicy::new(2, 2), Arc::new(observer));

        let mut script = VecDeque::from([timeout(), status(500), status(201)]);
        let response = executor
            .execute(&uri(), &CancellationToken::new(), || {
                let next = script.pop_front().unwrap();
                async move { next }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 1);
        assert!(events[0].1.contains("timed out"));
        assert_eq!(events[0].2, "https://example.com/resource");
        assert_eq!(events[0].3, Duration::from_secs(2));
        assert_eq!(events[1].0, 2);
        assert_eq!(events[1].1, "status 500");
        assert_eq!(events[1].3, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_observer_does_not_abort_retries() {
        let observer = |event: &RetryEvent<'_>| {
            if event.attempt > 0 {
                panic!("sink is broken");
            }
        };
        let executor = RetryExecutor::new(RetryPolicy::new(3, 2), Arc::new(observer));

        let mut script = VecDeque::from([503, 503, 200]);
        let response = executor
            .execute(&uri(), &CancellationToken::new(), || {
                let code = script.pop_front().unwrap();
                async move { status(code) }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_attempt_stops_immediately() {
        let executor = RetryExecutor::new(RetryPolicy::default(), Arc::new(NoopObserver));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let mut attempts = 0;
        let result = executor
            .execute(&uri(), &cancel, || {
                attempts += 1;
                std::future::pending::<Result<HttpResponse, TransportError>>()
            })
            .await;

        assert!(matches!(result, Err(HttpError::Cancelled)));
        assert_eq!(attempts, 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_backoff_skips_remaining_attempts() {
        let (count, observer) = counting_observer();
        let executor = RetryExecutor::new(RetryPolicy::default(), observer);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let mut attempts = 0;
        let result = executor
            .execute(&uri(), &cancel, || {
                attempts += 1;
                async { status(503) }
            })
            .await;

        assert!(matches!(result, Err(HttpError::Cancelled)));
        assert_eq!(attempts, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_sends_nothing() {
        let executor = RetryExecutor::new(RetryPolicy::default(), Arc::new(NoopObserver));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut attempts = 0;
        let result = executor
            .execute(&uri(), &cancel, || {
                attempts += 1;
                async { status(200) }
            })
            .await;

        assert!(matches!(result, Err(HttpError::Cancelled)));
        assert_eq!(attempts, 0);
    }
}
