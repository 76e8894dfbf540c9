// outbox.rs - JsonlOutbox: mail written to a JSONL file instead of sent.
//
// Used for local runs without SMTP credentials. Each message becomes one
// line: `{"sent_at": ..., "from": ..., "to": [...], "subject": ..., "body": ...}`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::NotifyError;
use crate::mail::{Mailer, OutgoingMail};

#[derive(Serialize)]
struct OutboxEntry<'a> {
    sent_at: DateTime<Utc>,
    #[serde(flatten)]
    mail: &'a OutgoingMail,
}

/// Appends every message to a JSON Lines file.
pub struct JsonlOutbox {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlOutbox {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Mailer for JsonlOutbox {
    fn send_mail(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        if mail.to.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        // Ensure parent directory exists.
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| NotifyError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let line = serde_json::to_string(&OutboxEntry {
            sent_at: Utc::now(),
            mail,
        })?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| NotifyError::Io {
                path: self.path.clone(),
                source,
            })?;
        writeln!(file, "{line}").map_err(|source| NotifyError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
