// notifier.rs - Notifier: render a notice and hand it to the mailer.
//
// Send failures are logged here and reported as `Delivery::Failed`; they
// never propagate as errors.

use std::sync::Arc;

use crate::mail::{Mailer, OutgoingMail};
use crate::notice::Notice;

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Nobody to send to; nothing was attempted.
    NoRecipients,
    /// The mailer failed; the failure has been logged.
    Failed,
}

/// Sends notices from one configured sender address.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    sender: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, sender: impl Into<String>) -> Self {
        Self {
            mailer,
            sender: sender.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Send one message with every recipient on it.
    pub fn notify(&self, notice: &Notice, recipients: &[String]) -> Delivery {
        if recipients.is_empty() {
            tracing::debug!(notice = notice.kind(), "no recipients, skipping notification");
            return Delivery::NoRecipients;
        }

        let mail = OutgoingMail {
            from: self.sender.clone(),
            to: recipients.to_vec(),
            subject: notice.subject(),
            body: notice.body(),
        };
        match self.mailer.send_mail(&mail) {
            Ok(()) => {
                tracing::info!(
                    notice = notice.kind(),
                    recipients = ?recipients,
                    subject = %mail.subject,
                    "notification sent"
                );
                Delivery::Sent
            }
            Err(e) => {
                tracing::warn!(
                    notice = notice.kind(),
                    recipients = ?recipients,
                    error = %e,
                    "failed to send notification"
                );
                Delivery::Failed
            }
        }
    }
}
