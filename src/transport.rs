//! The network-call primitive used by the retry loop.
//!
//! A [`Transport`] performs exactly one attempt. It either produces a
//! [`RawResponse`] (whatever its status) or a [`TransportError`] when no
//! response arrived. Deciding what an error status means is left to the
//! caller.

use http::HeaderMap;

use crate::error::TransportError;
use crate::request::RequestDescriptor;
use crate::tls::TlsConfig;
use crate::{Error, Result};

/// A complete response as received, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// The status code.
    pub status: u16,
    /// Header name/value pairs in the order the transport reported them.
    pub headers: Vec<(String, String)>,
    /// The full body.
    pub body: Vec<u8>,
    /// The URL the response came from, after any redirects.
    pub url: String,
}

/// Sends a single request attempt.
///
/// Implementations must not retry on their own. The descriptor's timeout
/// applies to the whole attempt, including reading the body.
///
/// # Examples
///
/// A transport that answers every request locally:
///
/// ```
/// use entreat::transport::{RawResponse, Transport};
/// use entreat::{RequestDescriptor, TransportError};
///
/// struct Canned;
///
/// impl Transport for Canned {
///     fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
///         Ok(RawResponse {
///             status: 200,
///             headers: vec![("Content-Type".into(), "text/plain".into())],
///             body: b"canned".to_vec(),
///             url: request.url().to_string(),
///         })
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Performs one attempt of `request`.
    fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// What a single attempt produced.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// A response with a status below 400.
    Success(RawResponse),
    /// A response with a status of 400 or above.
    ErrorResponse(RawResponse),
    /// No response at all.
    Failed(TransportError),
}

impl From<std::result::Result<RawResponse, TransportError>> for AttemptOutcome {
    fn from(result: std::result::Result<RawResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.status >= 400 => AttemptOutcome::ErrorResponse(response),
            Ok(response) => AttemptOutcome::Success(response),
            Err(error) => AttemptOutcome::Failed(error),
        }
    }
}

/// The default transport, backed by a blocking `reqwest` client.
///
/// TLS trust is fixed when the transport is created; the client builds a
/// dedicated transport for requests that ask for different trust settings.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Creates a transport trusting the certificates described by `tls`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a root certificate is invalid or the
    /// TLS backend fails to initialise.
    pub fn new(tls: &TlsConfig) -> Result<Self> {
        let builder = tls.apply(reqwest::blocking::Client::builder())?;
        let client = builder.build().map_err(|e| {
            Error::configuration(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<RawResponse, TransportError> {
        let response = self
            .client
            .request(request.method().clone(), request.url())
            .headers(request.headers().clone())
            .body(request.body().to_vec())
            .timeout(request.timeout())
            .send()?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = header_tuples(response.headers());
        let body = response.bytes()?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
            url,
        })
    }
}

// Values that are not visible ASCII are read as ISO-8859-1, which maps every
// byte to a char and never fails.
fn header_tuples(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = match value.to_str() {
                Ok(text) => text.to_string(),
                Err(_) => value.as_bytes().iter().map(|&b| char::from(b)).collect(),
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
