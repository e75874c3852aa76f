//! Default settings shared by every request of a client.

use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::tls::TlsConfig;

/// The user agent sent when a request does not set one.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; entreat/",
    env!("CARGO_PKG_VERSION"),
    "; +https://crates.io/crates/entreat)"
);

/// The per-attempt timeout used when a request does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings applied to a request unless its [`RequestOptions`] override them.
///
/// These are read-only once a [`Client`] is built; per-call options never
/// modify them.
///
/// [`RequestOptions`]: crate::RequestOptions
/// [`Client`]: crate::Client
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    /// Timeout of a single attempt.
    pub timeout: Duration,
    /// Retry budget and backoff schedule.
    pub retry: RetryPolicy,
    /// Certificate trust settings.
    pub tls: TlsConfig,
    /// Value of the `user-agent` header when the request omits it.
    pub user_agent: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            tls: TlsConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
