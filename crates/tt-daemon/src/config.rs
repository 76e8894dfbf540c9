// config.rs - Service configuration read from environment variables.
//
// Everything the handlers need is loaded once at startup. Loading goes
// through a lookup function so tests can supply a map instead of the
// process environment.

use std::path::PathBuf;

use thiserror::Error;
use tt_notify::SmtpSettings;
use tt_store::DEFAULT_PAGE_SIZE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Startup configuration for the daemon.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub tasks_table: String,
    pub goals_table: String,
    pub user_pool_id: String,
    /// SMTP login; also the sender address of every notice.
    pub mail_user: String,
    pub mail_password: String,
    /// Copied on every status change notice.
    pub admin_email: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Root for the record store and the user directory.
    pub data_dir: PathBuf,
    pub scan_page_size: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let tasks_table = match get("TASKS_TABLE").or_else(|| get("TASK_TABLE")) {
            Some(table) => table,
            None => return Err(ConfigError::Missing("TASKS_TABLE")),
        };

        let smtp_port = match get("SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "SMTP_PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => SmtpSettings::DEFAULT_PORT,
        };
        let scan_page_size = match get("SCAN_PAGE_SIZE") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SCAN_PAGE_SIZE",
                        value: raw,
                        reason: "expected a positive integer".into(),
                    })
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            tasks_table,
            goals_table: require("GOALS_TABLE")?,
            user_pool_id: require("USER_POOL_ID")?,
            mail_user: require("GMAIL_USER")?,
            mail_password: require("GMAIL_PASSWORD")?,
            admin_email: require("ADMIN_EMAIL")?,
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| SmtpSettings::DEFAULT_HOST.to_string()),
            smtp_port,
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            scan_page_size,
        })
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.mail_user.clone(),
            password: self.mail_password.clone(),
        }
    }
}
