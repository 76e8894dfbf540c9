// claims.rs - CallerIdentity: verified claims, normalized once at the boundary.
//
// Group claims arrive in several shapes depending on the gateway: a JSON
// list, a single name, a comma-joined string, or a bracketed list such as
// "[admin, staff]". All of them become one ordered Vec<String> here so
// business logic only ever checks a list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role name that grants task administration. Compared case-insensitively.
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Stable subject identifier from the identity provider.
    pub subject: String,

    /// Directory username; recorded as a task's `createdBy`.
    pub username: String,

    /// Verified email address.
    pub email: String,

    /// Role/group names, normalized and in claim order.
    pub roles: Vec<String>,
}

impl CallerIdentity {
    /// Identity with no roles whose username is its email.
    pub fn new(subject: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            subject: subject.into(),
            username: email.clone(),
            email,
            roles: Vec::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Normalize a group claim into an ordered list of role names.
///
/// Accepts a JSON array (non-string entries are skipped), a string, or
/// null. Entries are trimmed and empty entries dropped.
pub fn normalize_roles(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_role_string)
            .collect(),
        Value::String(text) => split_role_string(text),
        _ => Vec::new(),
    }
}

fn split_role_string(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(trimmed);

    let parts: Vec<&str> = if inner.contains(',') {
        inner.split(',').collect()
    } else if inner.len() != trimmed.len() {
        // Bracketed, space-separated: "[admin staff]".
        inner.split_whitespace().collect()
    } else {
        vec![inner]
    };

    parts
        .into_iter()
        .map(|p| p.trim().trim_matches('"'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_claims_keep_order() {
        assert_eq!(
            normalize_roles(&json!(["staff", "Admin"])),
            vec!["staff", "Admin"]
        );
    }

    #[test]
    fn single_string_claim() {
        assert_eq!(normalize_roles(&json!("admin")), vec!["admin"]);
    }

    #[test]
    fn comma_joined_claim() {
        assert_eq!(
            normalize_roles(&json!("admin, staff,,reviewers")),
            vec!["admin", "staff", "reviewers"]
        );
    }

    #[test]
    fn bracketed_claims() {
        assert_eq!(
            normalize_roles(&json!("[admin, staff]")),
            vec!["admin", "staff"]
        );
        assert_eq!(
            normalize_roles(&json!("[admin staff]")),
            vec!["admin", "staff"]
        );
    }

    #[test]
    fn empty_and_missing_claims() {
        assert!(normalize_roles(&json!("")).is_empty());
        assert!(normalize_roles(&json!("[]")).is_empty());
        assert!(normalize_roles(&Value::Null).is_empty());
        assert!(normalize_roles(&json!([1, 2])).is_empty());
    }

    #[test]
    fn admin_check_ignores_case() {
        let caller = CallerIdentity::new("sub-1", "lead@x.io").with_roles(["Admin"]);
        assert!(caller.is_admin());
        let caller = CallerIdentity::new("sub-2", "dev@x.io").with_roles(["staff"]);
        assert!(!caller.is_admin());
    }

    #[test]
    fn username_defaults_to_email() {
        let caller = CallerIdentity::new("sub-1", "lead@x.io");
        assert_eq!(caller.username, "lead@x.io");
        let caller = caller.with_username("lead");
        assert_eq!(caller.username, "lead");
        assert_eq!(caller.email, "lead@x.io");
    }
}
