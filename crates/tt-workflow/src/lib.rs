//! # tt-workflow
//!
//! The task-and-goal workflow of the tracker.
//!
//! Administrators create tasks and assign team members (provisioning
//! accounts for newcomers); team members record goals and progress against
//! a task; a scheduled reminder emails assignees of tasks due soon.
//!
//! Every operation is a short synchronous sequence of store calls plus
//! optional mail. Validation and authorization run before any write.
//! Multi-step operations are not transactional: a failure part way through
//! leaves earlier side effects (such as provisioned accounts) in place.
//!
//! ## Key components
//!
//! - [`Task`], [`Goal`], [`TaskStatus`], [`Progress`] - the records
//! - [`TaskWorkflow`] - create, list (role scoped), change status
//! - [`GoalWorkflow`] - create/update, list by task or user, delete
//! - [`DeadlineReminder`] - scan for deadlines inside the reminder horizon
//! - [`WorkflowError`] - failures classified by [`ErrorKind`]

pub mod deadline;
pub mod error;
pub mod goal;
pub mod model;
pub mod reminder;
pub mod task;

pub use deadline::parse_deadline;
pub use error::{ErrorKind, WorkflowError};
pub use goal::{GoalMode, GoalOutcome, GoalRequest, GoalWorkflow, TaskGoals};
pub use model::{Goal, GoalSummary, Progress, Tables, Task, TaskStatus};
pub use reminder::{DeadlineReminder, ReminderReport, UpcomingTask};
pub use task::{CreateTaskRequest, CreatedTask, StatusChange, TaskWorkflow};
