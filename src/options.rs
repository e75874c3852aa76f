//! Per-call request options.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::body::Body;
use crate::tls::TlsConfig;
use crate::{Error, Result};

/// Options for a single request.
///
/// Every field is optional; anything left unset falls back to the client's
/// [`Defaults`](crate::Defaults). Options only affect the call they are passed
/// to.
///
/// # Examples
///
/// ```no_run
/// use entreat::RequestOptions;
/// use serde_json::json;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), entreat::Error> {
/// let options = RequestOptions::default()
///     .with_header("Authorization", "Bearer abc123")
///     .with_json_body(&json!({"name": "Ada"}))?
///     .with_timeout(Duration::from_secs(5))
///     .with_retries(3)
///     .with_retry_delay(Duration::from_millis(100));
///
/// let response = entreat::post("https://api.example.com/users", options)?;
/// println!("{} after {} attempt(s)", response.status, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers. Names are case-insensitive; a later duplicate wins.
    pub headers: Vec<(String, String)>,
    /// Per-attempt network timeout.
    pub timeout: Option<Duration>,
    /// Certificate trust settings.
    pub tls: Option<TlsConfig>,
    /// The request body.
    pub body: Body,
    /// Query parameters appended to the URL.
    pub params: Option<Vec<(String, String)>>,
    /// Attempts allowed beyond the first.
    pub retries: Option<u32>,
    /// Wait before the first retry.
    pub retry_delay: Option<Duration>,
    /// Growth factor applied to the wait after each retry.
    pub retry_backoff: Option<f64>,
    /// Retry every error response regardless of status and method.
    pub force_retry: bool,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers.
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the certificate trust settings.
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Sets the body, replacing any body set before.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Sends `value` as JSON.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `value` cannot be serialized.
    pub fn with_json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.with_body(Body::json(value)?))
    }

    /// Sends the pairs as an URL-encoded form.
    pub fn with_form_body<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.with_body(Body::form(pairs))
    }

    /// Sends `text` as UTF-8.
    pub fn with_text_body(self, text: impl Into<String>) -> Self {
        self.with_body(Body::Text(text.into()))
    }

    /// Sends `bytes` unchanged.
    pub fn with_raw_body(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.with_body(Body::Raw(bytes.into()))
    }

    /// Adds a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Adds several query parameters.
    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .get_or_insert_with(Vec::new)
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the number of attempts allowed beyond the first.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Sets the wait before the first retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the growth factor of the wait between retries.
    pub fn with_retry_backoff(mut self, multiplier: f64) -> Self {
        self.retry_backoff = Some(multiplier);
        self
    }

    /// Retries every error response while attempts remain.
    pub fn with_force_retry(mut self, force: bool) -> Self {
        self.force_retry = force;
        self
    }

    /// Builds options from an untyped key/value map.
    ///
    /// Recognised keys are `headers`, `timeout` (seconds), `data`, `json`,
    /// `params`, `retries`, `retry_delay` (seconds), `retry_backoff` and
    /// `force_retry`. `data` may be a string (text body), an array of bytes
    /// (raw body) or an object of strings (form body); `json` takes precedence
    /// over `data` when both are given. Headers, form fields and params keep
    /// the order of the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown keys and for values of the
    /// wrong shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use entreat::{Error, RequestOptions};
    /// use serde_json::json;
    ///
    /// let options = RequestOptions::from_value(json!({
    ///     "params": {"page": 2},
    ///     "retries": 3,
    ///     "retry_delay": 0.05,
    /// }))
    /// .unwrap();
    /// assert_eq!(options.retries, Some(3));
    ///
    /// let err = RequestOptions::from_value(json!({"bogus_option": true})).unwrap_err();
    /// assert!(matches!(err, Error::Configuration(_)));
    /// ```
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawOptions = serde_json::from_value(value)
            .map_err(|e| Error::configuration(format!("Unsupported request options: {}", e)))?;

        let data = match raw.data {
            None => Body::Empty,
            Some(RawData::Text(text)) => Body::Text(text),
            Some(RawData::Raw(bytes)) => Body::Raw(bytes),
            Some(RawData::Form(pairs)) => Body::Form(pairs.into_iter().collect()),
        };
        let body = match raw.json {
            Some(json) => Body::Json(json),
            None => data,
        };

        let params = raw
            .params
            .map(|params| {
                params
                    .into_iter()
                    .map(|(key, value)| Ok((key.clone(), scalar_to_string(&key, value)?)))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        Ok(Self {
            headers: raw.headers.into_iter().collect(),
            timeout: raw.timeout.map(|s| seconds("timeout", s)).transpose()?,
            tls: None,
            body,
            params,
            retries: raw.retries,
            retry_delay: raw.retry_delay.map(|s| seconds("retry_delay", s)).transpose()?,
            retry_backoff: raw.retry_backoff,
            force_retry: raw.force_retry.unwrap_or(false),
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    headers: IndexMap<String, String>,
    timeout: Option<f64>,
    data: Option<RawData>,
    json: Option<serde_json::Value>,
    params: Option<IndexMap<String, serde_json::Value>>,
    retries: Option<u32>,
    retry_delay: Option<f64>,
    retry_backoff: Option<f64>,
    force_retry: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawData {
    Text(String),
    Raw(Vec<u8>),
    Form(IndexMap<String, String>),
}

fn seconds(option: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        Error::configuration(format!(
            "{} must be a non-negative number of seconds, got {}",
            option, secs
        ))
    })
}

fn scalar_to_string(key: &str, value: serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::configuration(format!(
            "params value for {:?} must be a string, number or boolean, got {}",
            key, other
        ))),
    }
}
