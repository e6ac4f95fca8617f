//! In-memory user and group directory.
//!
//! Stands in for the host learning platform's account store. Accounts are
//! soft-deleted, group member lists preserve insertion order, and
//! `group_members` reports accounts in creation order as the port
//! requires.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, GroupId, UserId};
use crate::ports::{Account, NewAccount, UserDirectory};

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct Group {
    #[allow(dead_code)]
    name: String,
    #[allow(dead_code)]
    idnumber: String,
    members: Vec<UserId>,
}

#[derive(Default)]
struct Directory {
    // Vec keeps account-creation order.
    accounts: Vec<StoredAccount>,
    groups: HashMap<GroupId, Group>,
    roles: HashMap<UserId, HashSet<String>>,
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<Directory>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/dev helper: inserts a pre-built account, e.g. with a chosen
    /// `created_at` to pin seat-enforcement ordering.
    pub async fn insert_account(&self, account: Account) {
        self.inner.write().await.accounts.push(StoredAccount {
            account,
            deleted: false,
        });
    }

    /// Test helper: roles currently assigned to an account.
    pub async fn roles_of(&self, id: &UserId) -> Vec<String> {
        self.inner
            .read()
            .await
            .roles
            .get(id)
            .map(|set| {
                let mut roles: Vec<String> = set.iter().cloned().collect();
                roles.sort();
                roles
            })
            .unwrap_or_default()
    }
}

impl Directory {
    fn find(&self, pred: impl Fn(&Account) -> bool) -> Option<Account> {
        self.accounts
            .iter()
            .find(|s| !s.deleted && pred(&s.account))
            .map(|s| s.account.clone())
    }

    fn get_mut(&mut self, id: &UserId) -> Option<&mut StoredAccount> {
        self.accounts
            .iter_mut()
            .find(|s| !s.deleted && s.account.id == *id)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        Ok(self.inner.read().await.find(|a| a.email == email))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DomainError> {
        Ok(self.inner.read().await.find(|a| a.username == username))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, DomainError> {
        Ok(self.inner.read().await.find(|a| a.id == *id))
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, DomainError> {
        let mut inner = self.inner.write().await;
        if inner.find(|a| a.email == new.email).is_some() {
            return Err(DomainError::Conflict(format!(
                "email {} already registered",
                new.email
            )));
        }
        let account = Account {
            id: UserId::new(),
            email: new.email,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            suspended: false,
            created_at: Utc::now(),
        };
        inner.accounts.push(StoredAccount {
            account: account.clone(),
            deleted: false,
        });
        Ok(account)
    }

    async fn update_account(&self, account: &Account) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .get_mut(&account.id)
            .ok_or(DomainError::not_found("user"))?;
        stored.account = account.clone();
        Ok(())
    }

    async fn set_suspended(&self, id: &UserId, suspended: bool) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        let stored = inner.get_mut(id).ok_or(DomainError::not_found("user"))?;
        stored.account.suspended = suspended;
        Ok(())
    }

    async fn delete_account(&self, id: &UserId) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .accounts
            .iter_mut()
            .find(|s| !s.deleted && s.account.id == *id)
            .ok_or(DomainError::not_found("user"))?;
        stored.deleted = true;
        Ok(())
    }

    async fn assign_role(&self, id: &UserId, role: &str) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        if inner.find(|a| a.id == *id).is_none() {
            return Err(DomainError::not_found("user"));
        }
        inner.roles.entry(*id).or_default().insert(role.to_string());
        Ok(())
    }

    async fn create_group(&self, name: &str, idnumber: &str) -> Result<GroupId, DomainError> {
        let mut inner = self.inner.write().await;
        let id = GroupId::new();
        inner.groups.insert(
            id,
            Group {
                name: name.to_string(),
                idnumber: idnumber.to_string(),
                members: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn group_exists(&self, group: &GroupId) -> Result<bool, DomainError> {
        Ok(self.inner.read().await.groups.contains_key(group))
    }

    async fn add_group_member(
        &self,
        group: &GroupId,
        user: &UserId,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        let group = inner
            .groups
            .get_mut(group)
            .ok_or(DomainError::not_found("group"))?;
        if !group.members.contains(user) {
            group.members.push(*user);
        }
        Ok(())
    }

    async fn is_group_member(
        &self,
        group: &GroupId,
        user: &UserId,
    ) -> Result<bool, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .groups
            .get(group)
            .is_some_and(|g| g.members.contains(user))
            && inner.find(|a| a.id == *user).is_some())
    }

    async fn group_members(&self, group: &GroupId) -> Result<Vec<Account>, DomainError> {
        let inner = self.inner.read().await;
        let group = inner
            .groups
            .get(group)
            .ok_or(DomainError::not_found("group"))?;
        // Walk accounts in creation order, keeping group members only.
        Ok(inner
            .accounts
            .iter()
            .filter(|s| !s.deleted && group.members.contains(&s.account.id))
            .map(|s| s.account.clone())
            .collect())
    }
}
