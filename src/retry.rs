//! Retry classification and backoff.
//!
//! Whether a failed attempt is repeated depends on two things only: the
//! response status and the request method. Some statuses say "try again
//! later" regardless of what was asked ([`ALWAYS_SAFE_RETRY_STATUSES`]);
//! others are only safe to repeat when repeating the request cannot cause a
//! second side effect ([`IDEMPOTENT_SAFE_RETRY_STATUSES`] combined with
//! [`IDEMPOTENT_SAFE_METHODS`]). Failures where no response arrived at all
//! are always retried while attempts remain.

use http::Method;
use std::time::Duration;

/// Statuses that are retried for every method.
pub const ALWAYS_SAFE_RETRY_STATUSES: [u16; 4] = [413, 425, 429, 503];

/// Statuses that are retried only for [`IDEMPOTENT_SAFE_METHODS`].
pub const IDEMPOTENT_SAFE_RETRY_STATUSES: [u16; 6] = [408, 409, 500, 502, 503, 504];

/// Methods whose repetition has no effect beyond the first execution.
pub const IDEMPOTENT_SAFE_METHODS: [Method; 4] =
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE];

/// Returns `true` if an error response with `status` may be retried for a
/// request made with `method`.
///
/// # Examples
///
/// ```
/// use entreat::retry::is_safe_to_retry;
/// use http::Method;
///
/// // Rate limiting is safe to retry for anything.
/// assert!(is_safe_to_retry(&Method::POST, 429));
/// // A server error is only safe to retry for idempotent methods.
/// assert!(is_safe_to_retry(&Method::GET, 500));
/// assert!(!is_safe_to_retry(&Method::POST, 500));
/// ```
pub fn is_safe_to_retry(method: &Method, status: u16) -> bool {
    ALWAYS_SAFE_RETRY_STATUSES.contains(&status)
        || (IDEMPOTENT_SAFE_METHODS.contains(method)
            && IDEMPOTENT_SAFE_RETRY_STATUSES.contains(&status))
}

/// How many times a request is attempted and how long to wait in between.
///
/// Delays grow geometrically: the first retry waits `initial_delay`, and each
/// later one waits `backoff_multiplier` times longer than the one before.
/// There is no jitter, so the schedule is fully determined by the policy.
///
/// # Examples
///
/// ```
/// use entreat::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy {
///     retries: 3,
///     initial_delay: Duration::from_millis(10),
///     backoff_multiplier: 2.0,
///     force_retry: false,
/// };
///
/// assert_eq!(policy.max_attempts(), 4);
/// let delays: Vec<_> = policy.delays().take(3).collect();
/// assert_eq!(
///     delays,
///     [
///         Duration::from_millis(10),
///         Duration::from_millis(20),
///         Duration::from_millis(40),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts allowed beyond the first one.
    pub retries: u32,
    /// The wait before the first retry.
    pub initial_delay: Duration,
    /// The factor applied to the wait after every retry.
    pub backoff_multiplier: f64,
    /// Retry every error response, ignoring the status classification.
    pub force_retry: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            force_retry: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn never() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// The total number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Decides whether an error response should be retried.
    pub fn should_retry(&self, method: &Method, status: u16) -> bool {
        self.force_retry || is_safe_to_retry(method, status)
    }

    /// The waits between consecutive attempts, in order.
    ///
    /// The iterator never ends; the retry loop stops drawing from it when the
    /// attempt budget is spent.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial_delay,
            multiplier: self.backoff_multiplier,
        }
    }
}

/// Iterator over the backoff schedule of a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Delays {
    next: Duration,
    multiplier: f64,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        // `as u64` saturates, so a runaway schedule pins at the maximum.
        let nanos = (current.as_nanos() as f64 * self.multiplier).round();
        self.next = Duration::from_nanos(nanos as u64);
        Some(current)
    }
}
