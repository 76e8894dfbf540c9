//! # tt-notify
//!
//! Email notifications for the task tracker.
//!
//! Notification mail is always best effort: a failed send is logged and
//! reported to the caller as [`Delivery::Failed`], never as an error that
//! would undo the operation that triggered it.
//!
//! ## Key components
//!
//! - [`Notice`] - the three messages the tracker sends, with their texts
//! - [`Mailer`] - transport trait; [`SmtpMailer`] (STARTTLS submission),
//!   [`JsonlOutbox`] (append to a file), [`RecordingMailer`] (in memory)
//! - [`Notifier`] - renders a notice for a recipient list and sends it

pub mod error;
pub mod mail;
pub mod notice;
pub mod notifier;
pub mod outbox;
pub mod smtp;

pub use error::NotifyError;
pub use mail::{Mailer, OutgoingMail, RecordingMailer};
pub use notice::Notice;
pub use notifier::{Delivery, Notifier};
pub use outbox::JsonlOutbox;
pub use smtp::{SmtpMailer, SmtpSettings};
