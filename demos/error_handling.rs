//! Example demonstrating the difference between error responses and errors.
//!
//! Run with: `cargo run --example error_handling`

use entreat::{Error, RequestOptions, TransportErrorKind};
use serde_json::json;
use std::time::Duration;

fn describe(result: Result<entreat::Response, Error>) {
    match result {
        Ok(response) if response.ok => {
            println!("  ok: {} ({} attempt(s))", response.status, response.attempts);
        }
        Ok(response) => {
            println!(
                "  error response: {} ({} attempt(s)), body: {:?}",
                response.status, response.attempts, response.text
            );
        }
        Err(Error::Transport(e)) if e.kind() == TransportErrorKind::Timeout => {
            println!("  timed out on every attempt: {}", e);
        }
        Err(Error::Transport(e)) => {
            println!("  no response ({}): {}", e.kind(), e);
        }
        Err(e) => {
            println!("  request never sent: {}", e);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("entreat=warn")
        .init();

    println!("=== Error status (returned as data) ===");
    describe(entreat::get(
        "https://httpbin.org/status/418",
        RequestOptions::new(),
    ));

    println!("=== Timeout ===");
    describe(entreat::get(
        "https://httpbin.org/delay/5",
        RequestOptions::new()
            .with_timeout(Duration::from_secs(1))
            .with_retries(2),
    ));

    println!("=== Unreachable host ===");
    describe(entreat::get(
        "http://localhost:1/",
        RequestOptions::new().with_retries(2),
    ));

    println!("=== Unsupported option ===");
    describe(
        RequestOptions::from_value(json!({"retries": 2, "proxy": "http://proxy:8080"}))
            .and_then(|options| entreat::get("https://httpbin.org/get", options)),
    );

    println!("=== Using ? with error statuses ===");
    let result = entreat::get("https://httpbin.org/status/500", RequestOptions::new())
        .and_then(entreat::Response::into_result);
    if let Err(e) = result {
        println!("  {}", e);
    }
}
