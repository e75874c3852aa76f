//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Make GET requests with query parameters
//! - Send JSON and form bodies
//! - Access the normalized response
//!
//! Run with: `cargo run --example basic_request`

use entreat::{Error, RequestOptions};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("entreat=debug,basic_request=info")
        .init();

    println!("=== GET Request Example ===");
    let response = entreat::get(
        "https://jsonplaceholder.typicode.com/posts",
        RequestOptions::new().with_param("id", "1"),
    )?;

    let posts: Vec<Post> = response.json()?;
    println!("Status: {} (ok: {})", response.status, response.ok);
    println!("Final URL: {}", response.url);
    println!("First title: {:?}", posts.first().map(|p| &p.title));
    println!();

    println!("=== POST JSON Example ===");
    let response = entreat::post(
        "https://jsonplaceholder.typicode.com/posts",
        RequestOptions::new().with_json_body(&json!({
            "title": "My New Post",
            "body": "This is the content of my new post!",
            "userId": 1,
        }))?,
    )?;

    let created: Post = response.json()?;
    println!("Created post ID: {}", created.id);
    println!("Attempts: {}", response.attempts);
    println!();

    println!("=== Response Headers ===");
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Decoded as: {:?}", response.encoding);
    for (name, values) in &response.headers_multi {
        if values.len() > 1 {
            println!("{} appeared {} times", name, values.len());
        }
    }

    Ok(())
}
