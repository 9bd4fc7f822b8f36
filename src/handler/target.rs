//! Parsed destination of a proxied request.

use axum::http::{header, HeaderMap, Method, Request, Uri};
use thiserror::Error;
use url::Url;

/// Errors raised while resolving the request target.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("request has no absolute URI and no Host header")]
    MissingHost,

    #[error("invalid request target: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Host header is not valid UTF-8")]
    InvalidHost,
}

/// Where the inbound request was headed.
///
/// Custom responses never contact this destination. The outgoing method
/// and headers are recorded for parity with forwarding handlers.
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    url: Url,
    pub method: Option<Method>,
    pub headers: HeaderMap,
}

impl TargetDescriptor {
    /// Resolve from an absolute-form URI, or from the Host header and an
    /// origin-form path.
    pub fn parse(uri: &Uri, host: Option<&str>) -> Result<Self, TargetError> {
        let url = if uri.scheme().is_some() {
            Url::parse(&uri.to_string())?
        } else {
            let host = host.ok_or(TargetError::MissingHost)?;
            let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
            Url::parse(&format!("http://{host}{path}"))?
        };

        Ok(Self {
            url,
            method: None,
            headers: HeaderMap::new(),
        })
    }

    pub fn from_request<B>(request: &Request<B>) -> Result<Self, TargetError> {
        let host = match request.headers().get(header::HOST) {
            Some(value) => Some(value.to_str().map_err(|_| TargetError::InvalidHost)?),
            None => None,
        };
        Self::parse(request.uri(), host)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Explicit port, else the scheme's default.
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn absolute_form_uri() {
        let uri: Uri = "http://api.example.com:8000/v1/items?limit=5".parse().unwrap();
        let target = TargetDescriptor::parse(&uri, Some("ignored.example")).unwrap();
        assert_eq!(target.scheme(), "http");
        assert_eq!(target.host(), Some("api.example.com"));
        assert_eq!(target.port(), Some(8000));
        assert_eq!(target.path(), "/v1/items");
        assert_eq!(target.query(), Some("limit=5"));
        assert!(target.method.is_none());
        assert!(target.headers.is_empty());
    }

    #[test]
    fn origin_form_uses_host_header() {
        let request = Request::builder()
            .uri("/status")
            .header("Host", "Example.COM")
            .body(Body::empty())
            .unwrap();
        let target = TargetDescriptor::from_request(&request).unwrap();
        assert_eq!(target.host(), Some("example.com"));
        assert_eq!(target.port(), Some(80));
        assert_eq!(target.path(), "/status");
    }

    #[test]
    fn origin_form_without_host_is_rejected() {
        let uri: Uri = "/status".parse().unwrap();
        assert!(matches!(
            TargetDescriptor::parse(&uri, None),
            Err(TargetError::MissingHost)
        ));
    }
}
