// reminder.rs - DeadlineReminder: email assignees of tasks due soon.
//
// Runs without a caller. Nothing records which tasks were already
// reminded, so a task inside the window is reminded on every run until its
// deadline passes. Only the first scan page is examined.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tt_notify::{Delivery, Notice, Notifier};
use tt_store::{Collection, Item, RecordStore, ScanRequest};

use crate::deadline::parse_deadline;
use crate::error::WorkflowError;

const UNTITLED: &str = "Untitled Task";

/// A task whose deadline falls inside the reminder window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingTask {
    pub task_id: String,
    pub title: String,
    pub assignees: Vec<String>,
    /// The deadline as stored.
    pub due_date: String,
}

/// What one reminder run did.
#[derive(Debug, Clone, Default)]
pub struct ReminderReport {
    pub scanned: usize,
    pub upcoming: Vec<UpcomingTask>,
    pub reminders_sent: usize,
    pub invalid_deadlines: usize,
    /// More tasks existed than fit on the first scan page.
    pub truncated: bool,
}

pub struct DeadlineReminder {
    store: Arc<dyn RecordStore>,
    tasks: Collection,
    notifier: Notifier,
    horizon: Duration,
}

impl DeadlineReminder {
    pub fn new(store: Arc<dyn RecordStore>, tasks: Collection, notifier: Notifier) -> Self {
        Self {
            store,
            tasks,
            notifier,
            horizon: Duration::days(3),
        }
    }

    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    pub fn run(&self) -> Result<ReminderReport, WorkflowError> {
        self.run_at(Utc::now())
    }

    /// Remind assignees of every task with `now < deadline <= now + horizon`.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<ReminderReport, WorkflowError> {
        let threshold = now + self.horizon;
        let page = self.store.scan(&self.tasks, &ScanRequest::all())?;

        let mut report = ReminderReport {
            scanned: page.items.len(),
            truncated: page.last_evaluated_key.is_some(),
            ..ReminderReport::default()
        };
        if report.truncated {
            tracing::warn!(
                scanned = report.scanned,
                "task scan truncated to first page, later tasks not checked"
            );
        }

        for item in &page.items {
            let Some(task) = self.upcoming(item, now, threshold, &mut report) else {
                continue;
            };
            if task.assignees.is_empty() {
                tracing::debug!(task_id = %task.task_id, "upcoming task has no assignees");
            } else {
                let notice = Notice::upcoming_deadline(&task.title, &task.due_date);
                if self.notifier.notify(&notice, &task.assignees) == Delivery::Sent {
                    report.reminders_sent += 1;
                }
            }
            report.upcoming.push(task);
        }

        tracing::info!(
            scanned = report.scanned,
            upcoming = report.upcoming.len(),
            sent = report.reminders_sent,
            invalid = report.invalid_deadlines,
            "deadline reminder run complete"
        );
        Ok(report)
    }

    fn upcoming(
        &self,
        item: &Item,
        now: DateTime<Utc>,
        threshold: DateTime<Utc>,
        report: &mut ReminderReport,
    ) -> Option<UpcomingTask> {
        let task_id = item
            .get(self.tasks.key_attribute())
            .and_then(Value::as_str)
            .unwrap_or_default();
        let raw_deadline = item.get("deadline").and_then(Value::as_str)?;
        let Some(due) = parse_deadline(raw_deadline) else {
            tracing::warn!(%task_id, deadline = %raw_deadline, "skipping task with unparseable deadline");
            report.invalid_deadlines += 1;
            return None;
        };
        if due <= now || due > threshold {
            return None;
        }

        let assignees = item
            .get("assignedTo")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(UpcomingTask {
            task_id: task_id.to_string(),
            title: item
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(UNTITLED)
                .to_string(),
            assignees,
            due_date: raw_deadline.to_string(),
        })
    }
}
