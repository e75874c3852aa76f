//! # Entreat - blocking HTTP requests that ask again, politely
//!
//! Entreat is a small convenience layer over `reqwest`'s blocking client. It
//! sends one request at a time with sensible defaults (a 30 second timeout,
//! system-trusted TLS, an identifying user agent) and retries the failures
//! that are safe to retry, without ever retrying something that could apply a
//! side effect twice.
//!
//! ## Quick Start
//!
//! ```no_run
//! use entreat::RequestOptions;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! fn main() -> Result<(), entreat::Error> {
//!     // GET with query parameters
//!     let response = entreat::get(
//!         "https://api.example.com/users",
//!         RequestOptions::default().with_param("name", "alice"),
//!     )?;
//!     println!("{} {:?}", response.status, response.text);
//!
//!     // POST a JSON body, with up to three retries
//!     let response = entreat::post(
//!         "https://api.example.com/users",
//!         RequestOptions::default()
//!             .with_json_body(&json!({"name": "Alice"}))?
//!             .with_retries(3),
//!     )?;
//!     if response.ok {
//!         let user: User = response.json()?;
//!         println!("Created user {} ({})", user.id, user.name);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## What gets retried
//!
//! | Outcome | Retried? |
//! |---|---|
//! | 413, 425, 429, 503 | always |
//! | 408, 409, 500, 502, 504 | only for GET, HEAD, OPTIONS, TRACE |
//! | any other status | never (unless `force_retry`) |
//! | no response (connect, TLS, timeout) | always |
//!
//! Waits between attempts start at `retry_delay` (10ms by default) and are
//! multiplied by `retry_backoff` (2 by default) after every retry. The budget
//! is `retries + 1` attempts (2 by default).
//!
//! ## Error Handling
//!
//! An error status is a perfectly good answer, so it is returned as a
//! [`Response`] with `ok == false`. Errors are reserved for requests that
//! could not be built, and for requests that got no response at all on their
//! final attempt:
//!
//! ```no_run
//! use entreat::{Error, RequestOptions};
//!
//! match entreat::delete("https://api.example.com/users/7", RequestOptions::default()) {
//!     Ok(response) if response.ok => println!("deleted"),
//!     Ok(response) => eprintln!("server said {}: {:?}", response.status, response.text),
//!     Err(Error::Transport(e)) => eprintln!("no response after retries: {}", e),
//!     Err(e) => eprintln!("request not sent: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! Attempts, retries and final outcomes are reported through `tracing`;
//! install a subscriber to see them.

mod body;
mod client;
mod config;
mod error;
mod options;
pub mod request;
mod response;
pub mod retry;
mod tls;
pub mod transport;

pub use body::Body;
pub use client::{Client, ClientBuilder};
pub use config::{Defaults, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use options::RequestOptions;
pub use request::RequestDescriptor;
pub use response::Response;
pub use retry::RetryPolicy;
pub use tls::TlsConfig;

use http::Method;
use std::sync::OnceLock;

static DEFAULT_CLIENT: OnceLock<Client> = OnceLock::new();

/// The client behind the free functions, created on first use.
fn default_client() -> Result<&'static Client> {
    if let Some(client) = DEFAULT_CLIENT.get() {
        return Ok(client);
    }
    let client = Client::new()?;
    Ok(DEFAULT_CLIENT.get_or_init(|| client))
}

/// Makes a request with the default client.
///
/// See [`Client::request`] for the retry behaviour and errors.
pub fn request(method: Method, url: &str, options: RequestOptions) -> Result<Response> {
    default_client()?.request(method, url, options)
}

/// Makes a GET request with the default client.
pub fn get(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::GET, url, options)
}

/// Makes a HEAD request with the default client.
pub fn head(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::HEAD, url, options)
}

/// Makes an OPTIONS request with the default client.
pub fn options(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::OPTIONS, url, options)
}

/// Makes a TRACE request with the default client.
pub fn trace(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::TRACE, url, options)
}

/// Makes a PUT request with the default client.
pub fn put(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::PUT, url, options)
}

/// Makes a DELETE request with the default client.
pub fn delete(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::DELETE, url, options)
}

/// Makes a POST request with the default client.
pub fn post(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::POST, url, options)
}

/// Makes a PATCH request with the default client.
pub fn patch(url: &str, options: RequestOptions) -> Result<Response> {
    request(Method::PATCH, url, options)
}
