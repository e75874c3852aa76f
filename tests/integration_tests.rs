//! Integration tests using wiremock to simulate HTTP servers.
//!
//! The client is blocking, so every call runs on tokio's blocking pool while
//! the mock server keeps serving from the async runtime.

use entreat::{Client, Error, RequestOptions, TransportErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

fn fast_client() -> Client {
    Client::builder()
        .retry_delay(Duration::from_millis(5))
        .build()
        .unwrap()
}

async fn received(mock_server: &MockServer) -> usize {
    mock_server.received_requests().await.unwrap().len()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_get_request() {
    let mock_server = MockServer::start().await;

    let response_data = TestData {
        id: 1,
        name: "Test".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_data))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let response = blocking(move || fast_client().get(&url, RequestOptions::new()))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.ok);
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());
    assert_eq!(response.url, format!("{}/test", mock_server.uri()));
    assert_eq!(response.encoding.as_deref(), Some("utf-8"));
    assert_eq!(response.json::<TestData>().unwrap(), response_data);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_body_overrides_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"a": 1})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/items", mock_server.uri());
    let response = blocking(move || {
        let options = RequestOptions::new()
            .with_header("Content-Type", "text/csv")
            .with_json_body(&json!({"a": 1}))?;
        fast_client().post(&url, options)
    })
    .await
    .unwrap();

    assert_eq!(response.status, 201);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_text_body_defaults_to_text_plain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/note"))
        .and(header("content-type", "text/plain"))
        .and(body_string("zażółć"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/note", mock_server.uri());
    let response = blocking(move || {
        fast_client().put(&url, RequestOptions::new().with_text_body("zażółć"))
    })
    .await
    .unwrap();

    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_form_and_raw_bodies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("user=ada&note=two+words"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("content-type", "application/octet-stream"))
        .and(wiremock::matchers::body_bytes(vec![0u8, 1, 2, 255]))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let (form, raw) = blocking(move || {
        let client = fast_client();
        let form = client.post(
            &format!("{}/form", uri),
            RequestOptions::new().with_form_body([("user", "ada"), ("note", "two words")]),
        );
        let raw = client.post(
            &format!("{}/upload", uri),
            RequestOptions::new().with_raw_body(vec![0u8, 1, 2, 255]),
        );
        (form, raw)
    })
    .await;

    assert_eq!(form.unwrap().status, 200);
    assert_eq!(raw.unwrap().status, 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_parameters_and_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust lang"))
        .and(query_param("page", "2"))
        .and(header("user-agent", entreat::DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/custom"))
        .and(header("user-agent", "probe/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let (search, custom) = blocking(move || {
        let client = fast_client();
        let search = client.get(
            &format!("{}/search", uri),
            RequestOptions::new()
                .with_param("q", "rust lang")
                .with_param("page", "2"),
        );
        let custom = client.get(
            &format!("{}/custom", uri),
            RequestOptions::new().with_header("USER-AGENT", "probe/1.0"),
        );
        (search, custom)
    })
    .await;

    assert!(search.unwrap().ok);
    assert!(custom.unwrap().ok);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_retry_on_5xx_for_get() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First two requests fail with 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                ResponseTemplate::new(500).set_body_string("Server error")
            } else {
                ResponseTemplate::new(200).set_body_string("fine")
            }
        })
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let response = blocking(move || fast_client().get(&url, RequestOptions::new().with_retries(3)))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.text.as_deref(), Some("fine"));
    assert_eq!(response.attempts, 3);
    assert!(response.was_retried());
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_500_is_returned_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let response = blocking(move || fast_client().post(&url, RequestOptions::new().with_retries(3)))
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert!(!response.ok);
    assert_eq!(response.attempts, 1);
    assert_eq!(response.text.as_deref(), Some("Server error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_force_retry_repeats_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let response = blocking(move || {
        fast_client().post(
            &url,
            RequestOptions::new().with_retries(2).with_force_retry(true),
        )
    })
    .await
    .unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(response.attempts, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_429_retried_up_to_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "600")
                .set_body_string("Rate limited"),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let start = Instant::now();
    let response = blocking(move || fast_client().post(&url, RequestOptions::new().with_retries(2)))
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(response.attempts, 3);
    assert_eq!(response.header("retry-after"), Some("600"));
    // The schedule comes from the policy alone, not from Retry-After.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_error_4xx_is_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let response = blocking(move || fast_client().get(&url, RequestOptions::new().with_retries(4)))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.ok);
    assert_eq!(response.body, b"Not found".to_vec());

    match response.into_result() {
        Err(Error::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cookies"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "a=1")
                .append_header("Set-Cookie", "b=2")
                .insert_header("X-Custom-Header", "custom-value"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/cookies", mock_server.uri());
    let response = blocking(move || fast_client().get(&url, RequestOptions::new()))
        .await
        .unwrap();

    assert_eq!(response.headers_multi["set-cookie"], vec!["a=1", "b=2"]);
    assert_eq!(response.headers["set-cookie"], "b=2");
    assert_eq!(response.header("X-Custom-Header"), Some("custom-value"));
    for name in response.headers.keys() {
        assert!(!response.headers_multi[name].is_empty());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_text_decoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"caf\xe9".to_vec(), "text/plain; charset=ISO-8859-1"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/binary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0xffu8, 0xfe, 0x00, 0x80], "application/octet-stream"),
        )
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let (latin1, binary) = blocking(move || {
        let client = fast_client();
        (
            client.get(&format!("{}/latin1", uri), RequestOptions::new()),
            client.get(&format!("{}/binary", uri), RequestOptions::new()),
        )
    })
    .await;

    let latin1 = latin1.unwrap();
    assert_eq!(latin1.text.as_deref(), Some("café"));
    assert_eq!(latin1.encoding.as_deref(), Some("iso-8859-1"));

    let binary = binary.unwrap();
    assert_eq!(binary.text, None);
    assert_eq!(binary.encoding, None);
    assert_eq!(binary.body, vec![0xff, 0xfe, 0x00, 0x80]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_redirect_reports_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/new", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/old", mock_server.uri());
    let response = blocking(move || fast_client().get(&url, RequestOptions::new()))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.url, format!("{}/new", mock_server.uri()));
    assert_eq!(response.attempts, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_is_retried_then_raised() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow", mock_server.uri());
    let result = blocking(move || {
        fast_client().get(
            &url,
            RequestOptions::new()
                .with_timeout(Duration::from_millis(200))
                .with_retries(1),
        )
    })
    .await;

    match result {
        Err(e) => {
            assert!(e.is_timeout(), "Expected timeout, got {:?}", e);
        }
        Ok(response) => panic!("Expected timeout, got {:?}", response),
    }
    assert_eq!(received(&mock_server).await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_refused() {
    // Reserve a port, then free it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{}/", port);

    let result = blocking(move || fast_client().get(&url, RequestOptions::new().with_retries(2)))
        .await;

    match result {
        Err(Error::Transport(e)) => assert_eq!(e.kind(), TransportErrorKind::Connect),
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsupported_option_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let url = format!("{}/test", mock_server.uri());
    let result = blocking(move || {
        let options = RequestOptions::from_value(json!({"retries": 2, "bogus_option": 1}))?;
        fast_client().get(&url, options)
    })
    .await;

    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_eq!(received(&mock_server).await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dynamic_options_drive_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(query_param("v", "1"))
        .and(header("x-api-key", "secret"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("field=value"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/submit", mock_server.uri());
    let response = blocking(move || {
        let options = RequestOptions::from_value(json!({
            "headers": {"X-Api-Key": "secret"},
            "data": {"field": "value"},
            "params": {"v": 1},
            "retries": 1,
            "retry_delay": 0.005,
        }))?;
        fast_client().post(&url, options)
    })
    .await
    .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.attempts, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_free_functions_use_default_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/item/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let (head, delete) = blocking(move || {
        (
            entreat::head(&format!("{}/ping", uri), RequestOptions::new()),
            entreat::delete(&format!("{}/item/1", uri), RequestOptions::new()),
        )
    })
    .await;

    assert_eq!(head.unwrap().status, 200);
    assert_eq!(delete.unwrap().status, 204);
}
