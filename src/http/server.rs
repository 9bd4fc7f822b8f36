//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the custom response handler
//! - Wire up middleware (tracing, concurrency limit, request ID)
//! - Resolve the request target and build one handler per request
//! - Run the handler in its own task and wait for its outcome
//! - Map reported failures to error responses

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::handler::{
    CustomResponseHandler, CustomResponseOptions, HandlerError, ResponseGenerator,
    TargetDescriptor,
};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::sink::ChannelSink;
use crate::net::{outcome_channel, ConnectionLifecycle, RequestOutcome};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ResponseGenerator>,
}

/// HTTP front end answering every request with a custom response.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    pub fn new(config: ProxyConfig, generator: Arc<dyn ResponseGenerator>) -> Self {
        let router = Self::build_router(&config, AppState { generator });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(custom_response_handler))
            .route("/", any(custom_response_handler))
            .with_state(state)
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

async fn custom_response_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();

    let target = match TargetDescriptor::from_request(&request) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting request");
            metrics::record_rejected_target();
            return (StatusCode::BAD_REQUEST, "Invalid request target").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        url = %target.url(),
        "Generating custom response"
    );

    let (outcome_tx, mut outcomes) = outcome_channel();
    let lifecycle = ConnectionLifecycle::new(request_id.clone(), outcome_tx.clone());
    let connection_id = lifecycle.id();
    // Dropped with this future, which is how a client disconnect shows up.
    let _close_on_drop = lifecycle.close_guard();

    let mut handler = match CustomResponseHandler::new(CustomResponseOptions {
        lifecycle,
        request_method: method,
        response: ChannelSink::new(outcome_tx),
        target,
        custom_response_function: Some(Arc::clone(&state.generator)),
    }) {
        Ok(handler) => handler,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Custom response handler misconfigured");
            return failure_response(&e);
        }
    };
    let response_sent = handler.response_sent_flag();

    tokio::spawn(async move {
        let state = handler.run().await;
        metrics::record_custom_response(state, start_time);
    });

    match outcomes.recv().await {
        Some(RequestOutcome::Respond(response)) => response,
        Some(RequestOutcome::Failed(err)) if response_sent.load(Ordering::Acquire) => {
            tracing::warn!(
                connection_id = %connection_id,
                kind = err.kind(),
                "Custom response failed after it was committed, aborting connection"
            );
            aborted_response()
        }
        Some(RequestOutcome::Failed(err)) => {
            tracing::debug!(
                connection_id = %connection_id,
                kind = err.kind(),
                "Answering with error response"
            );
            failure_response(&err)
        }
        None => {
            tracing::error!(connection_id = %connection_id, "Handler stopped without an outcome");
            (StatusCode::INTERNAL_SERVER_ERROR, "Custom response unavailable").into_response()
        }
    }
}

fn failure_response(error: &HandlerError) -> Response {
    match error {
        HandlerError::Transport(_) => {
            (StatusCode::BAD_GATEWAY, "Failed to write custom response").into_response()
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Custom response function failed",
        )
            .into_response(),
    }
}

/// Response whose body errors on first poll, so hyper tears the
/// connection down instead of completing an exchange.
fn aborted_response() -> Response {
    let body = futures_util::stream::once(std::future::ready(Err::<Bytes, _>(
        std::io::Error::new(
            std::io::ErrorKind::ConnectionAborted,
            "custom response already committed",
        ),
    )));
    Response::new(Body::from_stream(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{from_fn, BoxError, GeneratedResponse, RunState};
    use axum::http::Method;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    fn server(generator: Arc<dyn ResponseGenerator>) -> HttpServer {
        HttpServer::new(ProxyConfig::default(), generator)
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("Host", "api.example.com")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn answers_with_generated_response() {
        let generator = Arc::new(from_fn(|| {
            std::future::ready(Ok(Some(
                GeneratedResponse::new()
                    .with_status(201)
                    .with_body("ok")
                    .with_header("X-Id", "7"),
            )))
        }));
        let response = server(generator).router.oneshot(request("/items")).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-id"], "7");
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn keeps_client_request_id() {
        let generator = Arc::new(from_fn(|| std::future::ready(Ok(Some(GeneratedResponse::new())))));
        let mut req = request("/");
        req.headers_mut()
            .insert("x-request-id", "client-42".parse().unwrap());

        let response = server(generator).router.oneshot(req).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "client-42");
    }

    #[tokio::test]
    async fn generator_failure_maps_to_500() {
        let generator = Arc::new(from_fn(|| {
            std::future::ready(Err::<Option<GeneratedResponse>, BoxError>("boom".into()))
        }));
        let response = server(generator).router.oneshot(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn empty_result_maps_to_500() {
        let generator = Arc::new(from_fn(|| std::future::ready(Ok(None))));
        let response = server(generator).router.oneshot(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_host_is_rejected() {
        let generator = Arc::new(from_fn(|| std::future::ready(Ok(Some(GeneratedResponse::new())))));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = server(generator).router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failure_after_commit_aborts_instead_of_error_response() {
        let generator = Arc::new(from_fn(|| {
            std::future::ready(Ok(Some(
                GeneratedResponse::new()
                    .with_status(201)
                    .with_body("zz")
                    .with_encoding("hex"),
            )))
        }));
        let response = server(generator).router.oneshot(request("/")).await.unwrap();

        assert_ne!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn client_disconnect_while_generating_abandons_request() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (on_start, gate) = (Arc::clone(&started), Arc::clone(&release));
        let generator: Arc<dyn ResponseGenerator> = Arc::new(from_fn(move || {
            let (on_start, gate) = (Arc::clone(&on_start), Arc::clone(&gate));
            async move {
                on_start.notify_one();
                gate.notified().await;
                Ok::<_, BoxError>(Some(GeneratedResponse::new().with_body("late")))
            }
        }));

        let (outcome_tx, mut outcomes) = outcome_channel();
        let lifecycle = ConnectionLifecycle::new("req-disconnect", outcome_tx.clone());
        let close_guard = lifecycle.close_guard();
        let mut handler = CustomResponseHandler::new(CustomResponseOptions {
            lifecycle,
            request_method: Method::GET,
            response: ChannelSink::new(outcome_tx),
            target: TargetDescriptor::parse(&"http://api.example.com/".parse().unwrap(), None)
                .unwrap(),
            custom_response_function: Some(generator),
        })
        .unwrap();
        let response_sent = handler.response_sent_flag();
        let task = tokio::spawn(async move { handler.run().await });

        started.notified().await;
        drop(close_guard);
        release.notify_one();

        assert_eq!(task.await.unwrap(), RunState::Abandoned);
        assert!(outcomes.recv().await.is_none());
        assert!(!response_sent.load(Ordering::SeqCst));
    }
}
