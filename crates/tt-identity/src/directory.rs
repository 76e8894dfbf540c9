// directory.rs - UserDirectory trait, account records, in-memory backend.
//
// The directory mirrors the admin half of a hosted user pool: look a user
// up by username, or create one and have the directory deliver its own
// invitation. Accounts created this way start unconfirmed.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// How the directory delivers an invitation to a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMedium {
    Email,
    Sms,
}

/// A name/value attribute on an account (`email`, `email_verified`, `name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
    pub name: String,
    pub value: String,
}

/// An admin create-user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub attributes: Vec<UserAttribute>,
    pub delivery: Vec<DeliveryMedium>,
}

impl NewUser {
    /// A request whose invitation is delivered by email.
    pub fn invite_by_email(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: Vec::new(),
            delivery: vec![DeliveryMedium::Email],
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(UserAttribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Lifecycle of an account in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Created by an admin; the user must set a password from the invitation.
    ForceChangePassword,
    Confirmed,
}

/// Record of the invitation the directory sent for a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub delivery: Vec<DeliveryMedium>,
    pub sent_at: DateTime<Utc>,
}

/// A user account as the directory stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub attributes: BTreeMap<String, String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation: Option<Invitation>,
}

impl UserAccount {
    /// Account for an admin-created user, invitation stamped `now`.
    pub fn invited(user: &NewUser, now: DateTime<Utc>) -> Self {
        Self {
            username: user.username.clone(),
            attributes: user
                .attributes
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
            status: AccountStatus::ForceChangePassword,
            created_at: now,
            invitation: (!user.delivery.is_empty()).then(|| Invitation {
                delivery: user.delivery.clone(),
                sent_at: now,
            }),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Admin operations on a user pool.
pub trait UserDirectory: Send + Sync {
    /// Look up an account. `Ok(None)` means the user does not exist; any
    /// other failure is an error.
    fn get_user(&self, username: &str) -> Result<Option<UserAccount>, IdentityError>;

    /// Create an account and deliver the directory's invitation.
    fn create_user(&self, user: &NewUser) -> Result<UserAccount, IdentityError>;
}

/// Directory held in process memory.
#[derive(Default)]
pub struct MemoryUserDirectory {
    accounts: Mutex<BTreeMap<String, UserAccount>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with confirmed accounts.
    pub fn with_users<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let accounts = usernames
            .into_iter()
            .map(|username| {
                let username = username.into();
                let account = UserAccount {
                    username: username.clone(),
                    attributes: BTreeMap::new(),
                    status: AccountStatus::Confirmed,
                    created_at: now,
                    invitation: None,
                };
                (username, account)
            })
            .collect();
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    /// Snapshot of every account, ordered by username.
    pub fn accounts(&self) -> Vec<UserAccount> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, UserAccount>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn get_user(&self, username: &str) -> Result<Option<UserAccount>, IdentityError> {
        Ok(self.lock().get(username).cloned())
    }

    fn create_user(&self, user: &NewUser) -> Result<UserAccount, IdentityError> {
        let mut accounts = self.lock();
        if accounts.contains_key(&user.username) {
            return Err(IdentityError::UserExists(user.username.clone()));
        }
        let account = UserAccount::invited(user, Utc::now());
        accounts.insert(user.username.clone(), account.clone());
        Ok(account)
    }
}
