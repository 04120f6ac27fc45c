//! Request builder and response classifier for the portal API.
//!
//! # Design
//! `ApiClient` holds only a `base_url`. `build_*` methods produce an
//! `HttpRequest`, `parse_response` turns an `HttpResponse` into an
//! `ApiResult` or an `ApiError`, and `send` glues the two around a
//! caller-supplied `Transport`. No token lives here: the caller passes the
//! current one in, which keeps the client free of session state.

use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::ApiResult;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::Credentials;

pub const LOGIN_ENDPOINT: &str = "/auth/token";

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a JSON request for `endpoint`, attaching `token` as a bearer
    /// credential when present.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        if !endpoint.starts_with('/') {
            return Err(ApiError::InvalidEndpoint {
                method,
                endpoint: endpoint.to_string(),
            });
        }

        let mut headers = vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())];
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            method,
            url: format!("{}{endpoint}", self.base_url),
            endpoint: endpoint.to_string(),
            headers,
            body,
        })
    }

    /// Build the form-encoded password grant for `POST /auth/token`.
    pub fn build_login(&self, credentials: &Credentials) -> HttpRequest {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password)
            .append_pair("grant_type", "password")
            .finish();

        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{LOGIN_ENDPOINT}", self.base_url),
            endpoint: LOGIN_ENDPOINT.to_string(),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(body),
        }
    }

    /// Classify a response: 204 becomes a synthetic message, JSON bodies
    /// are parsed, anything else is kept as text. Non-2xx statuses become
    /// `ApiError::Http`.
    pub fn parse_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<ApiResult, ApiError> {
        if response.status == 204 {
            return Ok(ApiResult::no_content());
        }

        let data = decode_body(&response);

        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&data, response.status),
                method: request.method,
                endpoint: request.endpoint.clone(),
            });
        }

        Ok(ApiResult::new(data, Some(response.status)))
    }

    /// Execute `request` through `transport` and classify the outcome.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &HttpRequest,
    ) -> Result<ApiResult, ApiError> {
        debug!(method = %request.method, endpoint = %request.endpoint, "sending request");

        let response = transport.execute(request).map_err(|e| ApiError::Transport {
            message: e.to_string(),
            method: request.method,
            endpoint: request.endpoint.clone(),
        });

        let result = response.and_then(|response| {
            debug!(status = response.status, endpoint = %request.endpoint, "received response");
            self.parse_response(request, response)
        });

        if let Err(err) = &result {
            warn!(method = %request.method, endpoint = %request.endpoint, error = %err, "request failed");
        }
        result
    }
}

fn decode_body(response: &HttpResponse) -> Value {
    if response.is_json() {
        match serde_json::from_str(&response.body) {
            Ok(value) => return value,
            Err(e) => debug!(error = %e, "declared JSON body did not parse, keeping text"),
        }
    }
    Value::String(response.body.clone())
}

/// Pick the server-supplied error text from `detail` or `message`.
fn error_message(data: &Value, status: u16) -> String {
    ["detail", "message"]
        .iter()
        .filter_map(|key| data.get(key))
        .find(|value| !value.is_null())
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
