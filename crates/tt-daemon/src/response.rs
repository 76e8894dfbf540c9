// response.rs - JSON replies and errors with the CORS headers browsers need.
//
// Every response, success or failure, carries Allow-Origin `*`, the allowed
// request headers, and the Allow-Methods list of the route that produced it.

use axum::body::Bytes;
use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tt_workflow::WorkflowError;

pub const ALLOW_HEADERS: &str = "Authorization,Content-Type";

/// The Allow-Methods value advertised by one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowMethods(pub &'static str);

impl AllowMethods {
    pub const CREATE_TASK: AllowMethods = AllowMethods("POST,OPTIONS");
    pub const LIST_TASKS: AllowMethods = AllowMethods("GET,OPTIONS");
    pub const UPDATE_TASK: AllowMethods = AllowMethods("GET,OPTIONS,PUT");
    pub const TASK_GOALS: AllowMethods = AllowMethods("POST,OPTIONS");
    pub const SAVE_GOAL: AllowMethods = AllowMethods("POST,OPTIONS");
    pub const USER_GOALS: AllowMethods = AllowMethods("GET,OPTIONS");
    pub const DELETE_GOAL: AllowMethods = AllowMethods("POST,DELETE,OPTIONS");
    /// Every verb served on `/tasks`.
    pub const TASKS: AllowMethods = AllowMethods("GET,OPTIONS,POST");
    /// Every verb served on `/goals`.
    pub const GOALS: AllowMethods = AllowMethods("GET,OPTIONS,POST");
}

/// Serialize `body` as the JSON payload of a response.
pub fn reply<T: Serialize>(methods: AllowMethods, status: StatusCode, body: &T) -> Response {
    let mut response = (status, Json(body)).into_response();
    apply_cors(&mut response, methods);
    response
}

/// Set the CORS headers on an already-built response.
pub fn apply_cors(response: &mut Response, methods: AllowMethods) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(methods.0),
    );
}

/// A failed request, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    methods: AllowMethods,
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(methods: AllowMethods, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            methods,
            status,
            message: message.into(),
        }
    }

    pub fn from_workflow(methods: AllowMethods, error: WorkflowError) -> Self {
        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(methods, status, error.to_string())
    }

    pub fn bad_request(methods: AllowMethods, message: impl Into<String>) -> Self {
        Self::new(methods, StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(methods: AllowMethods, message: impl Into<String>) -> Self {
        Self::new(methods, StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self.message(), "request failed");
        } else {
            tracing::debug!(%status, error = %self.message(), "request rejected");
        }
        reply(self.methods, status, &json!({ "error": self.message }))
    }
}

/// Decode a JSON request body; malformed or missing bodies are a 400.
pub fn parse_body<T: DeserializeOwned>(methods: AllowMethods, body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request(methods, "Missing request body"));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(methods, format!("Invalid request body: {e}")))
}
