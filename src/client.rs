//! HTTP client with a verb-aware retry loop.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to change the defaults it applies to every request.

use crate::{
    config::Defaults,
    request::RequestDescriptor,
    retry::{Delays, RetryPolicy},
    tls::TlsConfig,
    transport::{AttemptOutcome, RawResponse, ReqwestTransport, Transport},
    Error, RequestOptions, Response, Result,
};
use http::{HeaderValue, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A blocking HTTP client that retries transient failures.
///
/// Each call runs to completion on the calling thread: attempts are made one
/// after another, with a growing pause in between, until a response arrives
/// that is either successful or not worth retrying, or the attempt budget is
/// spent.
///
/// The client only holds read-only defaults and is cheap to clone, so one
/// instance can serve many threads at once.
///
/// # Examples
///
/// ```no_run
/// use entreat::{Client, RequestOptions};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), entreat::Error> {
/// let client = Client::builder()
///     .timeout(Duration::from_secs(10))
///     .retries(3)
///     .retry_delay(Duration::from_millis(100))
///     .build()?;
///
/// let response = client.get("https://api.example.com/users/123", RequestOptions::default())?;
/// if response.ok {
///     println!("{}", response.text.unwrap_or_default());
/// } else {
///     eprintln!("failed with {} after {} attempts", response.status, response.attempts);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    builtin_transport: bool,
    defaults: Defaults,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client with the default settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TLS backend fails to initialise.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// The defaults applied to requests that do not override them.
    pub fn defaults(&self) -> &Defaults {
        &self.inner.defaults
    }

    /// Makes a request, retrying it according to the resolved retry policy.
    ///
    /// An error response (status 400 or above) is retried when its status is
    /// always safe to retry (413, 425, 429, 503), when the method is
    /// idempotent (GET, HEAD, OPTIONS, TRACE) and the status is one of 408,
    /// 409, 500, 502, 503 or 504, or when `force_retry` is set. Any other
    /// error response ends the loop and is returned as-is.
    ///
    /// A failure to get any response is retried while attempts remain.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] or [`Error::InvalidUrl`] if the request
    ///   cannot be built. Nothing is sent in that case.
    /// - [`Error::Transport`] if the final attempt received no response.
    ///
    /// Error statuses are never returned as errors.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use entreat::{Client, RequestOptions};
    /// use http::Method;
    ///
    /// # fn example() -> Result<(), entreat::Error> {
    /// let client = Client::new()?;
    /// let options = RequestOptions::default()
    ///     .with_form_body([("q", "rust")])
    ///     .with_force_retry(true);
    ///
    /// let response = client.request(Method::POST, "https://api.example.com/search", options)?;
    /// println!("{} after {} attempt(s)", response.status, response.attempts);
    /// # Ok(())
    /// # }
    /// ```
    pub fn request(&self, method: Method, url: &str, options: RequestOptions) -> Result<Response> {
        let descriptor = RequestDescriptor::build(method, url, &options, &self.inner.defaults)?;
        let policy = self.retry_policy(&options)?;
        let transport = self.transport_for(options.tls.as_ref())?;

        self.execute(transport.as_ref(), &descriptor, &policy)
    }

    fn retry_policy(&self, options: &RequestOptions) -> Result<RetryPolicy> {
        let defaults = &self.inner.defaults.retry;
        let policy = RetryPolicy {
            retries: options.retries.unwrap_or(defaults.retries),
            initial_delay: options.retry_delay.unwrap_or(defaults.initial_delay),
            backoff_multiplier: options.retry_backoff.unwrap_or(defaults.backoff_multiplier),
            force_retry: options.force_retry || defaults.force_retry,
        };
        validate_backoff(policy.backoff_multiplier)?;
        Ok(policy)
    }

    fn transport_for(&self, tls: Option<&TlsConfig>) -> Result<Arc<dyn Transport>> {
        match tls {
            Some(tls) if self.inner.builtin_transport && *tls != self.inner.defaults.tls => {
                Ok(Arc::new(ReqwestTransport::new(tls)?))
            }
            _ => Ok(Arc::clone(&self.inner.transport)),
        }
    }

    /// Runs the attempt loop for an already-built request.
    fn execute(
        &self,
        transport: &dyn Transport,
        request: &RequestDescriptor,
        policy: &RetryPolicy,
    ) -> Result<Response> {
        let start_time = Instant::now();
        let max_attempts = policy.max_attempts() as usize;
        let mut delays = policy.delays();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let attempts_remain = attempt < max_attempts;

            tracing::debug!(
                method = %request.method(),
                url = %request.url(),
                attempt = attempt,
                "Executing HTTP request"
            );

            match AttemptOutcome::from(transport.execute(request)) {
                AttemptOutcome::Success(raw) => {
                    return Ok(finish(raw, attempt, start_time));
                }
                AttemptOutcome::ErrorResponse(raw) => {
                    if !policy.should_retry(request.method(), raw.status) {
                        tracing::debug!(
                            status = raw.status,
                            method = %request.method(),
                            "Error response is not safe to retry"
                        );
                        return Ok(finish(raw, attempt, start_time));
                    }
                    tracing::warn!(
                        status = raw.status,
                        attempt = attempt,
                        method = %request.method(),
                        url = %request.url(),
                        "Retryable error response"
                    );
                    // The wait happens even when the budget is spent.
                    backoff(&mut delays, attempt);
                    if !attempts_remain {
                        return Ok(finish(raw, attempt, start_time));
                    }
                }
                AttemptOutcome::Failed(error) => {
                    if !attempts_remain {
                        tracing::error!(
                            error = %error,
                            attempts = attempt,
                            method = %request.method(),
                            url = %request.url(),
                            "Request failed, no attempts left"
                        );
                        return Err(Error::Transport(error));
                    }
                    tracing::warn!(
                        error = %error,
                        attempt = attempt,
                        method = %request.method(),
                        url = %request.url(),
                        "Request failed"
                    );
                    backoff(&mut delays, attempt);
                }
            }
        }
    }

    /// Makes a GET request.
    pub fn get(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::GET, url, options)
    }

    /// Makes a HEAD request.
    pub fn head(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::HEAD, url, options)
    }

    /// Makes an OPTIONS request.
    pub fn options(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::OPTIONS, url, options)
    }

    /// Makes a TRACE request.
    pub fn trace(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::TRACE, url, options)
    }

    /// Makes a PUT request.
    pub fn put(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PUT, url, options)
    }

    /// Makes a DELETE request.
    pub fn delete(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::DELETE, url, options)
    }

    /// Makes a POST request.
    pub fn post(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::POST, url, options)
    }

    /// Makes a PATCH request.
    pub fn patch(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PATCH, url, options)
    }
}

fn finish(raw: RawResponse, attempts: usize, start_time: Instant) -> Response {
    tracing::info!(
        status = raw.status,
        latency_ms = start_time.elapsed().as_millis(),
        attempts = attempts,
        "Received HTTP response"
    );
    Response::from_raw(raw, attempts)
}

fn backoff(delays: &mut Delays, attempt: usize) {
    if let Some(delay) = delays.next() {
        tracing::info!(
            delay_ms = delay.as_millis(),
            attempt = attempt,
            "Backing off before next attempt"
        );
        std::thread::sleep(delay);
    }
}

fn validate_backoff(multiplier: f64) -> Result<()> {
    if multiplier.is_finite() && multiplier >= 0.0 {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "retry_backoff must be a finite, non-negative number, got {}",
            multiplier
        )))
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use entreat::{ClientBuilder, TlsConfig};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), entreat::Error> {
/// let client = ClientBuilder::new()
///     .timeout(Duration::from_secs(5))
///     .retries(2)
///     .retry_backoff(3.0)
///     .user_agent("inventory-sync/2.1")
///     .tls(TlsConfig::new().add_root_pem(std::fs::read("ca.pem").unwrap()))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    defaults: Defaults,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            defaults: Defaults::default(),
            transport: None,
        }
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = timeout;
        self
    }

    /// Sets the number of attempts allowed beyond the first.
    pub fn retries(mut self, retries: u32) -> Self {
        self.defaults.retry.retries = retries;
        self
    }

    /// Sets the wait before the first retry.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.defaults.retry.initial_delay = delay;
        self
    }

    /// Sets the growth factor of the wait between retries.
    pub fn retry_backoff(mut self, multiplier: f64) -> Self {
        self.defaults.retry.backoff_multiplier = multiplier;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.defaults.retry = policy;
        self
    }

    /// Sets the certificate trust settings.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.defaults.tls = tls;
        self
    }

    /// Sets the user agent sent when a request does not set one.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.defaults.user_agent = user_agent.into();
        self
    }

    /// Sends requests through `transport` instead of the built-in one.
    ///
    /// A custom transport is responsible for honouring
    /// [`RequestDescriptor::tls`] if it supports per-request trust settings.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backoff multiplier is negative or
    /// not finite, the user agent is not a valid header value, or the TLS
    /// configuration is rejected.
    pub fn build(self) -> Result<Client> {
        validate_backoff(self.defaults.retry.backoff_multiplier)?;
        HeaderValue::try_from(self.defaults.user_agent.as_str())
            .map_err(|e| Error::configuration(format!("Invalid user agent: {}", e)))?;

        let builtin_transport = self.transport.is_none();
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.defaults.tls)?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                builtin_transport,
                defaults: self.defaults,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
