//! Error types for the portal API client.
//!
//! # Design
//! `ApiError` is the single failure type every controller operation returns.
//! Variants that happened on the wire carry the method and endpoint so the
//! presenter can show where a call failed. `Http` additionally carries the
//! status, which drives session invalidation (401/403).

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::http::HttpMethod;

/// Errors returned by `ApiClient` and `Controller` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required input was missing; raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// The endpoint did not start with `/`.
    #[error("Endpoint must start with /")]
    InvalidEndpoint { method: HttpMethod, endpoint: String },

    /// No response was received.
    #[error("{message}")]
    Transport {
        message: String,
        method: HttpMethod,
        endpoint: String,
    },

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        method: HttpMethod,
        endpoint: String,
    },

    /// A request payload could not be converted to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A successful response did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Status shown in the rendered envelope. Validation failures never
    /// reached the network and carry none; other non-HTTP failures show 500.
    pub fn display_status(&self) -> Option<u16> {
        match self {
            ApiError::Validation(_) => None,
            ApiError::Http { status, .. } => Some(*status),
            _ => Some(500),
        }
    }

    pub fn method(&self) -> Option<HttpMethod> {
        match self {
            ApiError::InvalidEndpoint { method, .. }
            | ApiError::Transport { method, .. }
            | ApiError::Http { method, .. } => Some(*method),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ApiError::InvalidEndpoint { endpoint, .. }
            | ApiError::Transport { endpoint, .. }
            | ApiError::Http { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// True for 401 and 403 responses, which invalidate the session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// The `{error, endpoint?, method?}` object rendered for this failure.
    pub fn to_display(&self) -> Value {
        let mut out = Map::new();
        out.insert("error".to_string(), json!(self.to_string()));
        if let Some(endpoint) = self.endpoint() {
            out.insert("endpoint".to_string(), json!(endpoint));
        }
        if let Some(method) = self.method() {
            out.insert("method".to_string(), json!(method.as_str()));
        }
        Value::Object(out)
    }
}

/// A transport could not complete the round-trip.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Token persistence failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The presenter could not serialize an envelope.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            message: "boom".to_string(),
            method: HttpMethod::Get,
            endpoint: "/api/users/me".to_string(),
        }
    }

    #[test]
    fn only_401_and_403_are_auth_failures() {
        assert!(http(401).is_auth_failure());
        assert!(http(403).is_auth_failure());
        assert!(!http(404).is_auth_failure());
        assert!(!http(500).is_auth_failure());
        let transport = ApiError::Transport {
            message: "connection refused".to_string(),
            method: HttpMethod::Get,
            endpoint: "/api/health".to_string(),
        };
        assert!(!transport.is_auth_failure());
    }

    #[test]
    fn display_status_per_variant() {
        assert_eq!(http(404).display_status(), Some(404));
        assert_eq!(ApiError::Validation("x".to_string()).display_status(), None);
        assert_eq!(
            ApiError::Deserialization("x".to_string()).display_status(),
            Some(500)
        );
    }

    #[test]
    fn display_object_includes_request_context() {
        let shown = http(404).to_display();
        assert_eq!(shown["error"], "boom");
        assert_eq!(shown["endpoint"], "/api/users/me");
        assert_eq!(shown["method"], "GET");
    }

    #[test]
    fn validation_display_has_only_error() {
        let shown = ApiError::Validation("Username and password are required".to_string()).to_display();
        assert_eq!(shown, json!({"error": "Username and password are required"}));
    }
}
