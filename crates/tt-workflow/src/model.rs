// model.rs - Task and Goal records as stored and served.
//
// Attribute names are camelCase on the wire and in the store. A Goal's
// `taskId` is a plain reference: nothing checks that the task exists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tt_store::Collection;

use crate::error::WorkflowError;

/// Key attribute of the Tasks collection.
pub const TASK_KEY: &str = "taskId";

/// Key attribute of the Goals collection.
pub const GOAL_KEY: &str = "goalId";

/// The two collections the workflows read and write.
#[derive(Debug, Clone)]
pub struct Tables {
    pub tasks: Collection,
    pub goals: Collection,
}

impl Tables {
    pub fn new(tasks_table: &str, goals_table: &str) -> Self {
        Self {
            tasks: Collection::new(tasks_table, TASK_KEY),
            goals: Collection::new(goals_table, GOAL_KEY),
        }
    }
}

/// Where a task stands. Changed only through the status operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| WorkflowError::Validation("Invalid status".into()))
    }
}

/// An admin-created unit of work.
///
/// Every field but the key defaults when absent, since the status
/// operation can materialize a record holding only `taskId` and `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Assignee emails in the order given at creation.
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Deadline exactly as submitted; see [`crate::parse_deadline`].
    #[serde(default)]
    pub deadline: String,
    /// Username of the creating admin.
    #[serde(default)]
    pub created_by: String,
}

/// Goal progress as a JSON number.
///
/// Whole values are held as integers (`42` and `42.0` both read back as
/// `42`); other decimals keep their value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Number", into = "Number")]
pub struct Progress(Number);

// Floats at or beyond 2^63 stay floats.
const WHOLE_LIMIT: f64 = 9_223_372_036_854_775_808.0;

impl Progress {
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Progress::from)
    }

    pub fn is_integer(&self) -> bool {
        !self.0.is_f64()
    }

    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }
}

impl From<Number> for Progress {
    fn from(number: Number) -> Self {
        match number.as_f64() {
            Some(value)
                if number.is_f64() && value.fract() == 0.0 && value.abs() < WHOLE_LIMIT =>
            {
                if value >= 0.0 {
                    Progress(Number::from(value as u64))
                } else {
                    Progress(Number::from(value as i64))
                }
            }
            _ => Progress(number),
        }
    }
}

impl From<Progress> for Number {
    fn from(progress: Progress) -> Self {
        progress.0
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress(Number::from(0u8))
    }
}

impl From<u32> for Progress {
    fn from(value: u32) -> Self {
        Progress(Number::from(value))
    }
}

impl From<Progress> for serde_json::Value {
    fn from(progress: Progress) -> Self {
        serde_json::Value::Number(progress.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A team member's unit of progress against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub goal_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub task_id: String,
    /// Identity-provider subject of the creator.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub progress: Progress,
    /// Unix epoch when a record predates creation stamps.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// The per-goal fields reported when listing a task's goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub goal_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub assignee: String,
}
