//! Example showing how the retry policy treats different statuses.
//!
//! httpbin answers with whatever status the path asks for, which makes the
//! classification easy to observe.
//!
//! Run with: `cargo run --example retry_policy`

use entreat::{Client, Error, RequestOptions};
use std::time::Duration;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("entreat=info,retry_policy=info")
        .init();

    let client = Client::builder()
        .retries(3)
        .retry_delay(Duration::from_millis(200))
        .retry_backoff(2.0)
        .build()?;

    // 503 is always safe to retry: 4 attempts, waits of 200, 400 and 800ms.
    let response = client.post("https://httpbin.org/status/503", RequestOptions::new())?;
    println!("POST 503 -> {} after {} attempts", response.status, response.attempts);

    // 500 is retried for GET...
    let response = client.get("https://httpbin.org/status/500", RequestOptions::new())?;
    println!("GET 500 -> {} after {} attempts", response.status, response.attempts);

    // ...but not for POST, where a repeat could apply the change twice.
    let response = client.post("https://httpbin.org/status/500", RequestOptions::new())?;
    println!("POST 500 -> {} after {} attempts", response.status, response.attempts);

    // Unless the caller knows better.
    let response = client.post(
        "https://httpbin.org/status/500",
        RequestOptions::new()
            .with_force_retry(true)
            .with_retries(1),
    )?;
    println!(
        "POST 500 (forced) -> {} after {} attempts",
        response.status, response.attempts
    );

    // 404 is never retried.
    let response = client.get("https://httpbin.org/status/404", RequestOptions::new())?;
    println!("GET 404 -> {} after {} attempts", response.status, response.attempts);

    Ok(())
}
