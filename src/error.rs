//! Error types for HTTP requests.
//!
//! Only two kinds of failure ever surface from a request: the call was
//! misconfigured (nothing was sent), or no response could be obtained from the
//! server after the retry budget was spent. A response with an error status is
//! *not* an error here; it comes back as a [`Response`](crate::Response) with
//! `ok == false`.

use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for HTTP requests.
///
/// # Examples
///
/// ```no_run
/// use entreat::{Error, RequestOptions};
///
/// match entreat::get("https://api.example.com/health", RequestOptions::default()) {
///     Ok(response) if response.ok => println!("healthy: {:?}", response.text),
///     Ok(response) => eprintln!("unhealthy, status {}", response.status),
///     Err(Error::Transport(e)) => eprintln!("no response ({}): {}", e.kind(), e),
///     Err(e) => eprintln!("bad request setup: {}", e),
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be built from the supplied options.
    ///
    /// Raised before any network activity and never retried: unsupported
    /// option keys, body or params of the wrong shape, invalid header names or
    /// values, and transports that fail to initialise all end up here.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No response was received on the final attempt.
    ///
    /// This is the error from the last attempt, exactly as the transport
    /// reported it. Earlier transport failures were absorbed by the retry loop.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be parsed as the requested JSON type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    Deserialization {
        /// The HTTP status code of the response
        status: u16,
        /// The serde error message
        serde_error: String,
    },

    /// The server answered with an error status.
    ///
    /// Only produced by [`Response::into_result`](crate::Response::into_result);
    /// the request functions themselves return error statuses as data.
    #[error("HTTP error {status} from {url}")]
    Status {
        /// The HTTP status code
        status: u16,
        /// The final URL of the request
        url: String,
    },
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Returns `true` if another attempt of the same request could succeed.
    ///
    /// Only transport failures qualify. By the time one of these reaches the
    /// caller the retry budget has already been used, so this is a hint for
    /// callers layering their own retries on top.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns `true` if the final attempt timed out.
    pub fn is_timeout(&self) -> bool {
        self.transport_kind() == Some(TransportErrorKind::Timeout)
    }

    /// Returns the kind of transport failure, if this is one.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Error::Transport(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Deserialization { status, .. } | Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The broad category of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// DNS resolution or TCP connection failed.
    Connect,
    /// The attempt exceeded its timeout.
    Timeout,
    /// The TLS handshake or certificate validation failed.
    Tls,
    /// The connection broke while reading the response.
    Read,
    /// Anything the transport could not categorise.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::Read => "read",
            Self::Other => "other",
        };
        f.write_str(text)
    }
}

/// A failure to obtain any HTTP response.
#[derive(thiserror::Error, Debug)]
#[error("transport error ({kind}): {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    /// Creates a transport error without an underlying cause.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping the underlying cause.
    pub fn with_source(
        kind: TransportErrorKind,
        source: impl Into<BoxError>,
    ) -> Self {
        let source = source.into();
        Self {
            kind,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Returns the category of this failure.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            if is_tls_failure(&error) {
                TransportErrorKind::Tls
            } else {
                TransportErrorKind::Connect
            }
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Read
        } else {
            TransportErrorKind::Other
        };
        TransportError::with_source(kind, error)
    }
}

// reqwest folds handshake failures into connect errors. The rustls error is
// still in the cause chain, usually as the payload of an `io::Error`.
fn is_tls_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(cause) = current {
        if cause.is::<rustls::Error>() {
            return true;
        }
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>()) {
                return true;
            }
        }
        current = cause.source();
    }
    false
}

/// A specialized `Result` type for HTTP requests.
///
/// This is a convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
