//! # tt-identity
//!
//! Identity plumbing for the task tracker.
//!
//! Authentication happens upstream: an identity gateway verifies the
//! bearer credential and hands over claims. This crate turns those claims
//! into a [`CallerIdentity`] once, and talks to the user directory when
//! task assignees need accounts.
//!
//! ## Key components
//!
//! - [`CallerIdentity`] - subject, username, email, normalized roles
//! - [`UserDirectory`] - lookup/create accounts (admin operations)
//! - [`JsonUserDirectory`] / [`MemoryUserDirectory`] - directory backends
//! - [`UserProvisioner`] - ensure an assignee has an account, inviting if new

pub mod claims;
pub mod directory;
pub mod error;
pub mod json_directory;
pub mod provision;

pub use claims::{normalize_roles, CallerIdentity, ADMIN_ROLE};
pub use directory::{
    AccountStatus, DeliveryMedium, Invitation, MemoryUserDirectory, NewUser, UserAccount,
    UserAttribute, UserDirectory,
};
pub use error::IdentityError;
pub use json_directory::JsonUserDirectory;
pub use provision::{ProvisionOutcome, UserProvisioner};
