// provision.rs - UserProvisioner: make sure an assignee has an account.

use std::sync::Arc;

use crate::directory::{NewUser, UserDirectory};
use crate::error::IdentityError;

/// Whether the account was already there or had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Existing,
    /// Created now; the directory sent its own invitation.
    Created,
}

impl ProvisionOutcome {
    pub fn existed(self) -> bool {
        matches!(self, ProvisionOutcome::Existing)
    }
}

/// Ensures accounts exist for task assignees.
#[derive(Clone)]
pub struct UserProvisioner {
    directory: Arc<dyn UserDirectory>,
}

impl UserProvisioner {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Look the email up as a username; create and invite it if absent.
    ///
    /// New accounts carry `email`, `email_verified=false`, and `name` when a
    /// display name is given.
    pub fn ensure(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<ProvisionOutcome, IdentityError> {
        if self.directory.get_user(email)?.is_some() {
            tracing::info!(%email, "user already exists");
            return Ok(ProvisionOutcome::Existing);
        }

        tracing::info!(%email, "user not found, creating");
        let mut user = NewUser::invite_by_email(email)
            .attribute("email", email)
            .attribute("email_verified", "false");
        if let Some(name) = display_name {
            user = user.attribute("name", name);
        }
        self.directory.create_user(&user)?;
        tracing::info!(%email, "user created and invited");
        Ok(ProvisionOutcome::Created)
    }
}
