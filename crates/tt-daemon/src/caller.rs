// caller.rs - Build the caller identity from gateway-supplied headers.
//
// The upstream identity gateway verifies the bearer token and forwards the
// claims as headers. Groups may arrive as a JSON list or as a plain string;
// both go through `normalize_roles`.

use axum::http::HeaderMap;
use serde_json::Value;
use tt_identity::{normalize_roles, CallerIdentity};
use tt_workflow::WorkflowError;

pub const SUBJECT_HEADER: &str = "x-caller-sub";
pub const EMAIL_HEADER: &str = "x-caller-email";
pub const USERNAME_HEADER: &str = "x-caller-username";
pub const GROUPS_HEADER: &str = "x-caller-groups";

pub fn caller_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, WorkflowError> {
    let subject = header_text(headers, SUBJECT_HEADER);
    let email = header_text(headers, EMAIL_HEADER);
    let (Some(subject), Some(email)) = (subject, email) else {
        return Err(WorkflowError::Forbidden("Missing caller identity".into()));
    };

    let mut caller = CallerIdentity::new(subject, email);
    if let Some(username) = header_text(headers, USERNAME_HEADER) {
        caller = caller.with_username(username);
    }
    if let Some(groups) = header_text(headers, GROUPS_HEADER) {
        let raw = serde_json::from_str::<Value>(&groups)
            .ok()
            .filter(Value::is_array)
            .unwrap_or(Value::String(groups));
        caller = caller.with_roles(normalize_roles(&raw));
    }
    Ok(caller)
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
