//! Port for the host platform's user and group directory.
//!
//! Vendor members are ordinary accounts on the learning platform; this
//! trait is the narrow slice of platform capability the billing core
//! needs: account CRUD, suspension, role assignment, and provisioning
//! groups with membership.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, GroupId, UserId};

/// A platform user account as the directory reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to create a platform account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// One-time password the user must change at first login.
    pub initial_password: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a non-deleted account by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, DomainError>;

    /// Creates an account with a forced password change at first login.
    async fn create_account(&self, account: NewAccount) -> Result<Account, DomainError>;

    /// Updates profile fields (email, username, names) of an account.
    async fn update_account(&self, account: &Account) -> Result<(), DomainError>;

    async fn set_suspended(&self, id: &UserId, suspended: bool) -> Result<(), DomainError>;

    /// Soft-deletes the account; it stops appearing in lookups and group
    /// member lists.
    async fn delete_account(&self, id: &UserId) -> Result<(), DomainError>;

    /// Assigns a site role; assigning an already-held role is a no-op.
    async fn assign_role(&self, id: &UserId, role: &str) -> Result<(), DomainError>;

    /// Creates a provisioning group.
    async fn create_group(&self, name: &str, idnumber: &str) -> Result<GroupId, DomainError>;

    async fn group_exists(&self, group: &GroupId) -> Result<bool, DomainError>;

    /// Adds an account to a group; re-adding an existing member is a no-op.
    async fn add_group_member(&self, group: &GroupId, user: &UserId)
        -> Result<(), DomainError>;

    async fn is_group_member(&self, group: &GroupId, user: &UserId)
        -> Result<bool, DomainError>;

    /// Non-deleted members of a group, in account-creation order.
    async fn group_members(&self, group: &GroupId) -> Result<Vec<Account>, DomainError>;
}
