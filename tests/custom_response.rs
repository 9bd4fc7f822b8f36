//! End-to-end tests: real listener, real HTTP client.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use custom_response_proxy::handler::{
    from_fn, BoxError, GeneratedResponse, ResponseGenerator, StaticResponseGenerator,
};
use custom_response_proxy::config::ResponseConfig;
use tokio::sync::Notify;

mod common;

#[tokio::test]
async fn serves_generated_status_headers_and_body() {
    let generator = Arc::new(from_fn(|| {
        std::future::ready(Ok(Some(
            GeneratedResponse::new()
                .with_status(201)
                .with_body("ok")
                .with_header("X-Id", "7"),
        )))
    }));
    let server = common::start_server(generator).await;

    let res = common::client()
        .post(server.url("/anything"))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 201);
    assert_eq!(res.headers()["x-id"], "7");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn empty_object_yields_bare_200() {
    let generator = Arc::new(from_fn(|| std::future::ready(Ok(Some(GeneratedResponse::default())))));
    let server = common::start_server(generator).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "");
}

#[tokio::test]
async fn missing_object_is_a_server_error() {
    let generator = Arc::new(from_fn(|| std::future::ready(Ok(None))));
    let server = common::start_server(generator).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn rejected_generator_is_a_server_error() {
    let generator = Arc::new(from_fn(|| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err::<Option<GeneratedResponse>, BoxError>("upstream API unavailable".into())
    }));
    let server = common::start_server(generator).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn generator_runs_once_per_request() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let generator = Arc::new(from_fn(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        std::future::ready(Ok(Some(GeneratedResponse::new().with_body(n.to_string()))))
    }));
    let server = common::start_server(generator).await;
    let client = common::client();

    for expected in 1..=3 {
        let body = client.get(server.url("/")).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, expected.to_string());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn slow_generator_does_not_block_other_requests() {
    let release = Arc::new(Notify::new());
    let gate = Arc::clone(&release);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let generator: Arc<dyn ResponseGenerator> = Arc::new(from_fn(move || {
        let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
        let gate = Arc::clone(&gate);
        async move {
            if first {
                gate.notified().await;
            }
            Ok::<_, BoxError>(Some(GeneratedResponse::new().with_body(if first { "slow" } else { "fast" })))
        }
    }));
    let server = common::start_server(generator).await;
    let client = common::client();

    let slow = tokio::spawn({
        let client = client.clone();
        let url = server.url("/slow");
        async move { client.get(url).send().await.unwrap().text().await.unwrap() }
    });
    while calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let fast = client.get(server.url("/fast")).send().await.unwrap().text().await.unwrap();
    assert_eq!(fast, "fast");

    release.notify_one();
    assert_eq!(slow.await.unwrap(), "slow");
}

#[tokio::test]
async fn static_generator_serves_configured_response() {
    let generator = Arc::new(StaticResponseGenerator::new(ResponseConfig {
        status_code: Some(503),
        body: Some("6d61696e74656e616e6365".into()),
        encoding: Some("hex".into()),
        headers: [("Retry-After", "120")].into_iter().collect(),
        delay_ms: 10,
    }));
    let server = common::start_server(generator.clone()).await;
    let client = common::client();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.headers()["retry-after"], "120");
    assert_eq!(res.text().await.unwrap(), "maintenance");

    generator.update(ResponseConfig {
        body: Some("back".into()),
        ..ResponseConfig::default()
    });
    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "back");
}
