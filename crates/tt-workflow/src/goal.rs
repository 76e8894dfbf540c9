// goal.rs - GoalWorkflow: record goals against tasks, list and delete them.
//
// A goal's `taskId` is only ever used to look up a default assignee; the
// task is not required to exist.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tt_identity::CallerIdentity;
use tt_store::{
    from_item, scan_all, to_item, Collection, RecordStore, ScanFilter, StoreError, UpdateMode,
};

use crate::error::WorkflowError;
use crate::model::{Goal, GoalSummary, Progress, Task};

/// Whether a goal request creates a new goal or overwrites one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMode {
    Create,
    Update,
}

impl GoalMode {
    /// `create` or absent means Create; `update` means Update.
    pub fn from_action(action: Option<&str>) -> Result<Self, WorkflowError> {
        match action {
            None | Some("create") => Ok(GoalMode::Create),
            Some("update") => Ok(GoalMode::Update),
            Some(other) => Err(WorkflowError::Validation(format!(
                "Invalid action: {other}"
            ))),
        }
    }
}

/// Body of a create-or-update goal request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub action: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub task_id: Option<String>,
    pub progress: Option<Progress>,
    pub assignee: Option<String>,
    pub goal_id: Option<String>,
}

/// Result of saving a goal.
#[derive(Debug, Clone)]
pub struct GoalOutcome {
    pub goal_id: String,
    pub mode: GoalMode,
    pub assignee: String,
}

impl GoalOutcome {
    pub fn message(&self) -> &'static str {
        match self.mode {
            GoalMode::Create => "Goal created successfully",
            GoalMode::Update => "Goal updated successfully",
        }
    }
}

/// Goals recorded against one task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGoals {
    pub task_id: String,
    pub goals: Vec<GoalSummary>,
}

#[derive(Clone)]
pub struct GoalWorkflow {
    store: Arc<dyn RecordStore>,
    tasks: Collection,
    goals: Collection,
}

impl GoalWorkflow {
    pub fn new(store: Arc<dyn RecordStore>, tasks: Collection, goals: Collection) -> Self {
        Self {
            store,
            tasks,
            goals,
        }
    }

    /// Create a goal, or overwrite the mutable fields of an existing one.
    ///
    /// The assignee is the explicit value if given, else the task creator,
    /// else the caller. Updating a goal that does not exist is a NotFound.
    pub fn save_goal(
        &self,
        caller: &CallerIdentity,
        request: GoalRequest,
    ) -> Result<GoalOutcome, WorkflowError> {
        let mode = GoalMode::from_action(request.action.as_deref())?;
        let title = required(request.title, "title")?;
        let description = required(request.description, "description")?;
        let due_date = required(request.due_date, "dueDate")?;
        let task_id = required(request.task_id, "taskId")?;
        let progress = request.progress.unwrap_or_default();

        let goal_id = match mode {
            GoalMode::Create => uuid::Uuid::new_v4().to_string(),
            GoalMode::Update => request
                .goal_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| WorkflowError::Validation("goalId is required for update".into()))?,
        };
        let assignee = self.resolve_assignee(request.assignee, &task_id, caller);

        match mode {
            GoalMode::Create => {
                let goal = Goal {
                    goal_id: goal_id.clone(),
                    title,
                    description,
                    due_date,
                    task_id,
                    user_id: caller.subject.clone(),
                    user_email: caller.email.clone(),
                    assignee: assignee.clone(),
                    progress,
                    created_at: Utc::now(),
                };
                self.store.put(&self.goals, to_item(&goal)?)?;
                tracing::info!(%goal_id, task_id = %goal.task_id, %assignee, "goal created");
            }
            GoalMode::Update => {
                let mut attributes = Map::new();
                attributes.insert("title".into(), Value::from(title));
                attributes.insert("description".into(), Value::from(description));
                attributes.insert("dueDate".into(), Value::from(due_date));
                attributes.insert("taskId".into(), Value::from(task_id));
                attributes.insert("progress".into(), Value::from(progress.clone()));
                attributes.insert("assignee".into(), Value::from(assignee.as_str()));
                self.store
                    .update(&self.goals, &goal_id, attributes, UpdateMode::MustExist)
                    .map_err(|e| match e {
                        StoreError::NotFound { .. } => {
                            WorkflowError::NotFound(format!("Goal {goal_id} not found"))
                        }
                        other => other.into(),
                    })?;
                tracing::info!(%goal_id, %assignee, %progress, "goal updated");
            }
        }

        Ok(GoalOutcome {
            goal_id,
            mode,
            assignee,
        })
    }

    /// Summaries of every goal recorded against `task_id`.
    pub fn goals_for_task(&self, task_id: Option<&str>) -> Result<TaskGoals, WorkflowError> {
        let task_id = task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WorkflowError::Validation("Missing taskId parameter".into()))?;

        let items = scan_all(
            self.store.as_ref(),
            &self.goals,
            Some(ScanFilter::eq("taskId", task_id)),
        )?;
        let goals = items
            .into_iter()
            .map(from_item::<GoalSummary>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TaskGoals {
            task_id: task_id.to_string(),
            goals,
        })
    }

    /// Every goal the caller created, matched on identity-provider subject.
    pub fn goals_for_user(&self, caller: &CallerIdentity) -> Result<Vec<Goal>, WorkflowError> {
        let items = scan_all(
            self.store.as_ref(),
            &self.goals,
            Some(ScanFilter::eq("userId", caller.subject.as_str())),
        )?;
        Ok(items
            .into_iter()
            .map(from_item::<Goal>)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a goal by id. Deleting an absent goal succeeds.
    pub fn delete_goal(&self, goal_id: &str) -> Result<bool, WorkflowError> {
        let removed = self.store.delete(&self.goals, goal_id)?;
        tracing::info!(%goal_id, removed, "goal deleted");
        Ok(removed)
    }

    fn resolve_assignee(
        &self,
        explicit: Option<String>,
        task_id: &str,
        caller: &CallerIdentity,
    ) -> String {
        if let Some(assignee) = explicit.filter(|a| !a.trim().is_empty()) {
            return assignee;
        }
        self.task_creator(task_id)
            .unwrap_or_else(|| caller.email.clone())
    }

    /// `createdBy` of the task, or `None` when it cannot be found or read.
    fn task_creator(&self, task_id: &str) -> Option<String> {
        let lookup = self
            .store
            .get(&self.tasks, task_id)
            .and_then(|item| item.map(from_item::<Task>).transpose());
        match lookup {
            Ok(Some(task)) if !task.created_by.is_empty() => Some(task.created_by),
            Ok(_) => {
                tracing::debug!(%task_id, "no task creator found for goal assignee");
                None
            }
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "task lookup failed, assigning goal to caller");
                None
            }
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, WorkflowError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(WorkflowError::missing_field(field)),
    }
}
