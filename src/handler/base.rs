//! Capabilities a handler borrows from the connection it serves.

use std::future::Future;
use std::sync::Arc;

use crate::handler::error::HandlerError;
use crate::handler::response::ResponseBody;

/// Connection-owned lifecycle hooks.
///
/// The closed flag is only observed here, never set.
pub trait Lifecycle: Send + Sync {
    /// Whether the client connection has gone away.
    fn is_closed(&self) -> bool;

    /// Diagnostic sink. Nothing logged here reaches the client.
    fn log(&self, message: &str);

    /// Report a terminal per-request failure to the framework.
    fn fail(&self, error: HandlerError);
}

impl<T: Lifecycle + ?Sized> Lifecycle for Arc<T> {
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn log(&self, message: &str) {
        (**self).log(message)
    }

    fn fail(&self, error: HandlerError) {
        (**self).fail(error)
    }
}

/// Outgoing half of the client exchange.
pub trait ResponseSink: Send {
    fn set_status(&mut self, status: u16) -> Result<(), HandlerError>;

    /// Replaces any earlier value for `name`.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HandlerError>;

    /// Write the body and finish the response.
    fn end(
        &mut self,
        body: Option<ResponseBody>,
        encoding: Option<String>,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}
