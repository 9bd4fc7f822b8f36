//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the response definition before it can be served
//! - Validate value ranges and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, including on reload

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::config::schema::{ProxyConfig, ResponseConfig};
use crate::handler::TextEncoding;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing [response] section")]
    MissingResponse,

    #[error("response.status_code {0} is outside 100..=999")]
    InvalidStatus(u16),

    #[error("response.encoding {0:?} is not supported")]
    UnknownEncoding(String),

    #[error("response.body cannot be encoded as {0}")]
    UnencodableBody(String),

    #[error("response header name {0:?} is invalid")]
    InvalidHeaderName(String),

    #[error("response header {0:?} has an invalid value")]
    InvalidHeaderValue(String),

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.max_connections must be greater than 0")]
    ZeroConnections,
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match &config.response {
        Some(response) => errors.extend(validate_response(response)),
        None => errors.push(ValidationError::MissingResponse),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that the response can be written as configured.
pub fn validate_response(response: &ResponseConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(status) = response.status_code {
        if StatusCode::from_u16(status).is_err() {
            errors.push(ValidationError::InvalidStatus(status));
        }
    }

    if let Some(name) = &response.encoding {
        match name.parse::<TextEncoding>() {
            Ok(encoding) => {
                let unencodable = response
                    .body
                    .as_deref()
                    .is_some_and(|body| encoding.encode(body).is_err());
                if unencodable {
                    errors.push(ValidationError::UnencodableBody(encoding.to_string()));
                }
            }
            Err(_) => errors.push(ValidationError::UnknownEncoding(name.clone())),
        }
    }

    for (name, value) in response.headers.iter() {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.to_string()));
        } else if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue(name.to_string()));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ResponseHeaders;

    fn config_with(response: ResponseConfig) -> ProxyConfig {
        ProxyConfig {
            response: Some(response),
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn default_response_is_valid() {
        assert_eq!(validate_config(&config_with(ResponseConfig::default())), Ok(()));
    }

    #[test]
    fn missing_response_is_rejected() {
        assert_eq!(
            validate_config(&ProxyConfig::default()),
            Err(vec![ValidationError::MissingResponse])
        );
    }

    #[test]
    fn collects_every_error() {
        let mut config = config_with(ResponseConfig {
            status_code: Some(1200),
            encoding: Some("ebcdic".into()),
            headers: [("bad name", "1"), ("X-Ok", "line\nbreak")]
                .into_iter()
                .collect::<ResponseHeaders>(),
            ..ResponseConfig::default()
        });
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "nowhere".into()
                },
                ValidationError::InvalidStatus(1200),
                ValidationError::UnknownEncoding("ebcdic".into()),
                ValidationError::InvalidHeaderName("bad name".into()),
                ValidationError::InvalidHeaderValue("X-Ok".into()),
            ]
        );
    }

    #[test]
    fn body_must_fit_encoding() {
        let errors = validate_response(&ResponseConfig {
            body: Some("not hex".into()),
            encoding: Some("hex".into()),
            ..ResponseConfig::default()
        });
        assert_eq!(errors, vec![ValidationError::UnencodableBody("hex".into())]);
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = config_with(ResponseConfig::default());
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
