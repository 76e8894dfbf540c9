// notice.rs - The messages the tracker sends.
//
// Subjects and bodies are user-facing text that recipients' mail filters
// may match on; keep them stable.

use serde::{Deserialize, Serialize};

/// A notification and the facts it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// An existing account was added to a task.
    TaskInvitation { task_title: String },

    /// A task's status was changed by someone.
    StatusChanged {
        task_title: String,
        changed_by: String,
    },

    /// A task is due within the reminder horizon.
    UpcomingDeadline { task_title: String, due_date: String },
}

impl Notice {
    pub fn task_invitation(task_title: &str) -> Self {
        Notice::TaskInvitation {
            task_title: task_title.to_string(),
        }
    }

    pub fn status_changed(task_title: &str, changed_by: &str) -> Self {
        Notice::StatusChanged {
            task_title: task_title.to_string(),
            changed_by: changed_by.to_string(),
        }
    }

    pub fn upcoming_deadline(task_title: &str, due_date: &str) -> Self {
        Notice::UpcomingDeadline {
            task_title: task_title.to_string(),
            due_date: due_date.to_string(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::TaskInvitation { .. } => "task_invitation",
            Notice::StatusChanged { .. } => "status_changed",
            Notice::UpcomingDeadline { .. } => "upcoming_deadline",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notice::TaskInvitation { task_title } => {
                format!("Invitation to Work on Task: {task_title}")
            }
            Notice::StatusChanged { task_title, .. } => {
                format!("Change In Status of task: {task_title}")
            }
            Notice::UpcomingDeadline { task_title, .. } => {
                format!("[UPCOMING DEADLINE] Task: {task_title}")
            }
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notice::TaskInvitation { task_title } => format!(
                "Hello, You have been added as a team member to Task: '{task_title}'. \
                 Please login to your portal to set goals"
            ),
            Notice::StatusChanged {
                task_title,
                changed_by,
            } => format!(
                "Hello, The status of task: {task_title} was changed by: {changed_by}. \
                 Log in to view the new updates"
            ),
            Notice::UpcomingDeadline {
                task_title,
                due_date,
            } => format!(
                "Reminder: The task '{task_title}' is due on {due_date}. \
                 Please ensure it's completed on time."
            ),
        }
    }
}
