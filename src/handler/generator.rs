//! User-supplied response generators.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures_util::future::{BoxFuture, FutureExt};

use crate::config::ResponseConfig;
use crate::handler::error::BoxError;
use crate::handler::response::{GeneratedResponse, ResponseBody};

/// `Ok(None)` is a generator that resolved without a response object.
pub type GeneratorResult = Result<Option<GeneratedResponse>, BoxError>;

/// Produces a response in place of forwarding upstream.
///
/// Called with no arguments, once per request. Anything request-specific
/// has to be captured by the implementation itself.
pub trait ResponseGenerator: Send + Sync {
    fn generate(&self) -> BoxFuture<'static, GeneratorResult>;
}

/// Generator backed by a closure. See [`from_fn`].
#[derive(Clone)]
pub struct GeneratorFn<F> {
    f: F,
}

/// Wrap a closure returning a future as a [`ResponseGenerator`].
///
/// Synchronous generators return `std::future::ready(..)`.
pub fn from_fn<F, Fut>(f: F) -> GeneratorFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = GeneratorResult> + Send + 'static,
{
    GeneratorFn { f }
}

impl<F, Fut> ResponseGenerator for GeneratorFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = GeneratorResult> + Send + 'static,
{
    fn generate(&self) -> BoxFuture<'static, GeneratorResult> {
        (self.f)().boxed()
    }
}

/// Serves the `[response]` section of the configuration.
///
/// The live response can be replaced while requests are in flight; each
/// call works from the snapshot taken when it started.
pub struct StaticResponseGenerator {
    response: ArcSwap<ResponseConfig>,
}

impl StaticResponseGenerator {
    pub fn new(response: ResponseConfig) -> Self {
        Self {
            response: ArcSwap::from_pointee(response),
        }
    }

    /// Swap in a new response for subsequent requests.
    pub fn update(&self, response: ResponseConfig) {
        self.response.store(Arc::new(response));
        tracing::info!("Custom response definition updated");
    }

    pub fn current(&self) -> Arc<ResponseConfig> {
        self.response.load_full()
    }
}

impl ResponseGenerator for StaticResponseGenerator {
    fn generate(&self) -> BoxFuture<'static, GeneratorResult> {
        let snapshot = self.response.load_full();
        async move {
            if snapshot.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(snapshot.delay_ms)).await;
            }
            Ok(Some(GeneratedResponse {
                status_code: snapshot.status_code,
                body: snapshot.body.clone().map(ResponseBody::Text),
                headers: snapshot.headers.clone(),
                encoding: snapshot.encoding.clone(),
            }))
        }
        .boxed()
    }
}
