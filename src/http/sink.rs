//! Response sink that hands a finished response back to axum.
//!
//! Status and headers are staged locally; `end` assembles the
//! `Response<Body>` and delivers it over the request's outcome channel.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};

use crate::handler::{HandlerError, ResponseBody, ResponseSink};
use crate::net::{OutcomeSender, RequestOutcome};

pub struct ChannelSink {
    status: StatusCode,
    headers: HeaderMap,
    outcomes: Option<OutcomeSender>,
}

impl ChannelSink {
    pub fn new(outcomes: OutcomeSender) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            outcomes: Some(outcomes),
        }
    }
}

impl ResponseSink for ChannelSink {
    fn set_status(&mut self, status: u16) -> Result<(), HandlerError> {
        self.status = StatusCode::from_u16(status)
            .map_err(|_| HandlerError::Configuration(format!("invalid status code {status}")))?;
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HandlerError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HandlerError::Configuration(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            HandlerError::Configuration(format!("invalid value for header {name}"))
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    async fn end(
        &mut self,
        body: Option<ResponseBody>,
        encoding: Option<String>,
    ) -> Result<(), HandlerError> {
        let outcomes = self
            .outcomes
            .take()
            .ok_or_else(|| HandlerError::Transport("response already ended".to_string()))?;

        let bytes = match body {
            Some(body) => body.encode(encoding.as_deref())?,
            None => Default::default(),
        };

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);

        outcomes
            .send(RequestOutcome::Respond(response))
            .map_err(|_| HandlerError::Transport("client connection closed".to_string()))
    }
}
