// mail.rs - OutgoingMail and the Mailer transport trait.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// A plain-text message addressed to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivers mail. Implementations are shared across handlers.
pub trait Mailer: Send + Sync {
    fn send_mail(&self, mail: &OutgoingMail) -> Result<(), NotifyError>;
}

/// Keeps every delivered message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with a transport error.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Messages delivered so far, in send order.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OutgoingMail>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Mailer for RecordingMailer {
    fn send_mail(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("connection refused".into()));
        }
        self.lock().push(mail.clone());
        Ok(())
    }
}
