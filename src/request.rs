//! Building the immutable description of a request.

use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::time::Duration;
use url::Url;

use crate::body::encode_pairs;
use crate::config::Defaults;
use crate::options::RequestOptions;
use crate::tls::TlsConfig;
use crate::{Error, Result};

/// Parses a verb such as `"get"` or `"POST"` into one of the supported
/// methods.
///
/// # Errors
///
/// Returns a configuration error for verbs outside GET, HEAD, OPTIONS, TRACE,
/// PUT, DELETE, POST and PATCH.
///
/// # Examples
///
/// ```
/// use entreat::request::parse_verb;
/// use http::Method;
///
/// assert_eq!(parse_verb("post").unwrap(), Method::POST);
/// assert!(parse_verb("BREW").is_err());
/// ```
pub fn parse_verb(verb: &str) -> Result<Method> {
    match verb.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "HEAD" => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        "TRACE" => Ok(Method::TRACE),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "POST" => Ok(Method::POST),
        "PATCH" => Ok(Method::PATCH),
        _ => Err(Error::configuration(format!("Unsupported HTTP method: {}", verb))),
    }
}

/// Everything needed to send one request, fully resolved.
///
/// A descriptor is built once per call and shared by every attempt.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Vec<u8>,
    timeout: Duration,
    tls: Option<TlsConfig>,
}

impl RequestDescriptor {
    /// Resolves `options` against `defaults` into a descriptor.
    ///
    /// Header names are lower-cased and a `user-agent` is added if missing.
    /// The body determines the `content-type`: JSON always sets
    /// `application/json`; the other kinds only fill it in when the caller did
    /// not set one. Query parameters are encoded and appended after a `?`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid header names or values and
    /// bodies that cannot be encoded, and [`Error::InvalidUrl`] when the
    /// resulting URL does not parse as an absolute URL.
    pub fn build(
        method: Method,
        url: &str,
        options: &RequestOptions,
        defaults: &Defaults,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let name = HeaderName::try_from(name.to_ascii_lowercase()).map_err(|e| {
                Error::configuration(format!("Invalid header name {:?}: {}", name, e))
            })?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                Error::configuration(format!("Invalid header value for {}: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        if !headers.contains_key(USER_AGENT) {
            let agent = HeaderValue::try_from(defaults.user_agent.as_str()).map_err(|e| {
                Error::configuration(format!("Invalid default user agent: {}", e))
            })?;
            headers.insert(USER_AGENT, agent);
        }

        if let Some((content_type, overrides)) = options.body.content_type() {
            if overrides || !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }
        let body = options.body.encode()?;

        // Appended verbatim: a URL that already has a query gets a second `?`.
        let url = match &options.params {
            Some(params) if !params.is_empty() => format!("{}?{}", url, encode_pairs(params)),
            _ => url.to_string(),
        };
        Url::parse(&url)?;

        Ok(Self {
            method,
            url,
            headers,
            body,
            timeout: options.timeout.unwrap_or(defaults.timeout),
            tls: options.tls.clone(),
        })
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute URL, including any query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request headers. Names are always lower case.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The encoded body, empty when there is none.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The timeout of each attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Trust settings for this request, when they differ from the client's.
    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }
}
