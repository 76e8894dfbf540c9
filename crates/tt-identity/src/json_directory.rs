// json_directory.rs - JsonUserDirectory: a user pool persisted as JSON files.
//
// Layout: `<root>/<pool_id>/<username>.json`. Used by the daemon when no
// hosted identity provider sits behind it; invitations are recorded on the
// account and announced in the log.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tt_store::file_name_problem;

use crate::directory::{NewUser, UserAccount, UserDirectory};
use crate::error::IdentityError;

/// User directory for one pool, one JSON file per account.
pub struct JsonUserDirectory {
    pool_dir: PathBuf,
    create_lock: Mutex<()>,
}

impl JsonUserDirectory {
    /// Open (creating if needed) the pool directory under `root`.
    pub fn open(root: impl AsRef<Path>, pool_id: &str) -> Result<Self, IdentityError> {
        validate_username(pool_id)?;
        let pool_dir = root.as_ref().join(pool_id);
        fs::create_dir_all(&pool_dir).map_err(|source| IdentityError::Io {
            path: pool_dir.clone(),
            source,
        })?;
        Ok(Self {
            pool_dir,
            create_lock: Mutex::new(()),
        })
    }

    fn account_file(&self, username: &str) -> Result<PathBuf, IdentityError> {
        validate_username(username)?;
        Ok(self.pool_dir.join(format!("{username}.json")))
    }
}

impl UserDirectory for JsonUserDirectory {
    fn get_user(&self, username: &str) -> Result<Option<UserAccount>, IdentityError> {
        let path = self.account_file(username)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(IdentityError::Io { path, source }),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn create_user(&self, user: &NewUser) -> Result<UserAccount, IdentityError> {
        let path = self.account_file(&user.username)?;
        let _guard = self.create_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if path.exists() {
            return Err(IdentityError::UserExists(user.username.clone()));
        }

        let account = UserAccount::invited(user, Utc::now());
        let json = serde_json::to_string_pretty(&account)?;
        fs::write(&path, json).map_err(|source| IdentityError::Io {
            path: path.clone(),
            source,
        })?;

        if let Some(invitation) = &account.invitation {
            tracing::info!(
                username = %account.username,
                delivery = ?invitation.delivery,
                "invitation delivered for new account"
            );
        }
        Ok(account)
    }
}

fn validate_username(username: &str) -> Result<(), IdentityError> {
    match file_name_problem(username) {
        None => Ok(()),
        Some(reason) => Err(IdentityError::InvalidUsername {
            username: username.to_string(),
            reason,
        }),
    }
}
