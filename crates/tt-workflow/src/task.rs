// task.rs - TaskWorkflow: create tasks, list them by role, change status.
//
// Validation and the admin check run before anything is written. During
// creation every assignee is provisioned in order; the first failure aborts
// the request and accounts created before it stay created.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tt_identity::{CallerIdentity, UserProvisioner};
use tt_notify::{Delivery, Notice, Notifier};
use tt_store::{from_item, scan_all, to_item, Collection, RecordStore, ScanFilter, UpdateMode};

use crate::error::WorkflowError;
use crate::model::{Task, TaskStatus};

/// Body of a task creation request.
///
/// `assigned_to` stays untyped so a wrong shape can be answered with a
/// validation message instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Value>,
    /// Display names keyed by assignee email, used for new accounts.
    #[serde(default)]
    pub assignee_names: HashMap<String, String>,
    pub deadline: Option<String>,
}

/// Result of a successful creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTask {
    pub task: Task,
    /// Assignees whose accounts were created by this request.
    #[serde(skip)]
    pub provisioned: Vec<String>,
    /// Pre-existing assignees sent the task invitation.
    #[serde(skip)]
    pub invited: Vec<String>,
}

/// Result of a status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub task_id: String,
    pub status: TaskStatus,
    /// Whether a task record existed before the change.
    pub found: bool,
    pub recipients: Vec<String>,
    pub delivery: Delivery,
}

/// Create, list and update tasks.
#[derive(Clone)]
pub struct TaskWorkflow {
    store: Arc<dyn RecordStore>,
    tasks: Collection,
    provisioner: UserProvisioner,
    notifier: Notifier,
    admin_email: String,
}

impl TaskWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tasks: Collection,
        provisioner: UserProvisioner,
        notifier: Notifier,
        admin_email: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tasks,
            provisioner,
            notifier,
            admin_email: admin_email.into(),
        }
    }

    /// Create a task, provisioning accounts for assignees that lack one.
    ///
    /// Only assignees who already had an account get the task invitation;
    /// new accounts receive the directory's own invitation instead.
    pub fn create_task(
        &self,
        caller: &CallerIdentity,
        request: CreateTaskRequest,
    ) -> Result<CreatedTask, WorkflowError> {
        if !caller.is_admin() {
            return Err(WorkflowError::Forbidden(
                "Only admins can create tasks.".into(),
            ));
        }
        let assigned_to = assignee_list(request.assigned_to.as_ref())?;
        let title = required(request.title, "title")?;
        let description = required(request.description, "description")?;
        let deadline = required(request.deadline, "deadline")?;

        let mut provisioned = Vec::new();
        let mut existing = Vec::new();
        for email in &assigned_to {
            let name = request.assignee_names.get(email).map(String::as_str);
            let outcome = self.provisioner.ensure(email, name).map_err(|source| {
                tracing::error!(%email, error = %source, "failed to provision assignee");
                WorkflowError::Provisioning {
                    email: email.clone(),
                    source,
                }
            })?;
            if outcome.existed() {
                existing.push(email.clone());
            } else {
                provisioned.push(email.clone());
            }
        }

        let task = Task {
            task_id: uuid::Uuid::new_v4().to_string(),
            title,
            description,
            assigned_to,
            status: TaskStatus::Pending,
            deadline,
            created_by: caller.username.clone(),
        };
        self.store.put(&self.tasks, to_item(&task)?)?;
        tracing::info!(
            task_id = %task.task_id,
            assignees = task.assigned_to.len(),
            created = provisioned.len(),
            "task created"
        );

        let invited = match self
            .notifier
            .notify(&Notice::task_invitation(&task.title), &existing)
        {
            Delivery::Sent => existing,
            Delivery::NoRecipients | Delivery::Failed => Vec::new(),
        };

        Ok(CreatedTask {
            task,
            provisioned,
            invited,
        })
    }

    /// Every task for an admin; otherwise the tasks assigned to the caller.
    pub fn list_tasks(&self, caller: &CallerIdentity) -> Result<Vec<Task>, WorkflowError> {
        let filter = if caller.is_admin() {
            None
        } else {
            Some(ScanFilter::contains("assignedTo", caller.email.as_str()))
        };
        let items = scan_all(self.store.as_ref(), &self.tasks, filter)?;
        let tasks = items
            .into_iter()
            .map(from_item::<Task>)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = tasks.len(), admin = caller.is_admin(), "listed tasks");
        Ok(tasks)
    }

    /// Set a task's status and tell its assignees and the administrator.
    ///
    /// An unknown task id is not an error: the status is written anyway and
    /// only the administrator is notified.
    pub fn update_status(
        &self,
        caller: &CallerIdentity,
        task_id: &str,
        status: Option<&str>,
    ) -> Result<StatusChange, WorkflowError> {
        let status: TaskStatus = status.unwrap_or_default().parse()?;

        let existing = match self.store.get(&self.tasks, task_id)? {
            Some(item) => Some(from_item::<Task>(item)?),
            None => {
                tracing::warn!(%task_id, "status update for unknown task");
                None
            }
        };
        let found = existing.is_some();
        let (title, mut recipients) = existing
            .map(|task| (task.title, task.assigned_to))
            .unwrap_or_default();

        let mut attributes = Map::new();
        attributes.insert("status".into(), Value::from(status.as_str()));
        self.store
            .update(&self.tasks, task_id, attributes, UpdateMode::Upsert)?;
        tracing::info!(%task_id, %status, changed_by = %caller.email, "task status updated");

        recipients.push(self.admin_email.clone());
        let delivery = self
            .notifier
            .notify(&Notice::status_changed(&title, &caller.email), &recipients);

        Ok(StatusChange {
            task_id: task_id.to_string(),
            status,
            found,
            recipients,
            delivery,
        })
    }
}

fn assignee_list(raw: Option<&Value>) -> Result<Vec<String>, WorkflowError> {
    let invalid =
        || WorkflowError::Validation("assignedTo must be a non-empty list of emails".into());
    let entries = match raw {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(invalid()),
    };
    entries
        .iter()
        .map(|entry| match entry {
            Value::String(email) if !email.trim().is_empty() => Ok(email.clone()),
            _ => Err(invalid()),
        })
        .collect()
}

fn required(value: Option<String>, field: &str) -> Result<String, WorkflowError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(WorkflowError::missing_field(field)),
    }
}
