//! Vendor directory service.
//!
//! Owns vendor lookup and upsert, lazy provisioning of the vendor's group
//! and administrator account, seat queries, and portal-driven member
//! management (create, suspend, update, delete).

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::vendor::{normalize_email, BillingError, Vendor, VendorPatch};
use crate::ports::{Account, AuditLevel, AuditLog, NewAccount, UserDirectory, VendorRepository};

use super::notifications::Mailer;

/// Site role held by vendor administrators.
pub const VENDOR_ADMIN_ROLE: &str = "vendor_admin";

/// Request to provision a member account through the portal.
#[derive(Debug, Clone)]
pub struct NewVendorUser {
    pub email: String,
    /// Defaults to the email address when absent.
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Profile changes for an existing member. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct VendorDirectory {
    vendors: Arc<dyn VendorRepository>,
    users: Arc<dyn UserDirectory>,
    audit: Arc<dyn AuditLog>,
    mailer: Arc<Mailer>,
}

impl VendorDirectory {
    pub fn new(
        vendors: Arc<dyn VendorRepository>,
        users: Arc<dyn UserDirectory>,
        audit: Arc<dyn AuditLog>,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            vendors,
            users,
            audit,
            mailer,
        }
    }

    /// Finds a vendor by processor identifiers. A subscription-ID match
    /// beats a customer-ID match.
    pub async fn find_by_processor_ids(
        &self,
        subscription_id: Option<&str>,
        customer_id: Option<&str>,
    ) -> Result<Option<Vendor>, DomainError> {
        if let Some(subscription_id) = subscription_id.filter(|s| !s.is_empty()) {
            if let Some(vendor) = self.vendors.find_by_subscription_id(subscription_id).await? {
                return Ok(Some(vendor));
            }
        }
        if let Some(customer_id) = customer_id.filter(|c| !c.is_empty()) {
            if let Some(vendor) = self.vendors.find_by_customer_id(customer_id).await? {
                return Ok(Some(vendor));
            }
        }
        Ok(None)
    }

    pub async fn find_by_admin_email(
        &self,
        email: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        self.vendors.find_by_admin_email(&email).await
    }

    /// Merge-or-create. Lookup order: subscription ID, customer ID, admin
    /// email; when a record is found the patch merges into it, otherwise a
    /// new vendor is created with defaults for the unset fields.
    pub async fn upsert(&self, patch: VendorPatch) -> Result<Vendor, DomainError> {
        let now = chrono::Utc::now();

        let existing = match self
            .find_by_processor_ids(
                patch.stripe_subscription_id.as_deref(),
                patch.stripe_customer_id.as_deref(),
            )
            .await?
        {
            Some(vendor) => Some(vendor),
            None => match patch.admin_email.as_deref() {
                Some(email) => self.find_by_admin_email(email).await?,
                None => None,
            },
        };

        match existing {
            Some(mut vendor) => {
                vendor.apply(patch, now);
                self.vendors.update(&vendor).await?;
                tracing::debug!(vendor_id = %vendor.id, "vendor updated");
                Ok(vendor)
            }
            None => {
                let vendor = Vendor::create_from(patch, now);
                self.vendors.insert(&vendor).await?;
                tracing::info!(vendor_id = %vendor.id, org_name = %vendor.org_name, "vendor created");
                Ok(vendor)
            }
        }
    }

    /// Ensures the vendor has a provisioning group, creating one on first
    /// use. Idempotent; a dangling group reference is replaced.
    pub async fn ensure_group(&self, vendor: &mut Vendor) -> Result<(), DomainError> {
        if let Some(group_id) = vendor.group_id {
            if self.users.group_exists(&group_id).await? {
                return Ok(());
            }
        }

        let group_id = self
            .users
            .create_group(&vendor.group_name(), &vendor.group_idnumber())
            .await?;
        vendor.group_id = Some(group_id);
        vendor.updated_at = chrono::Utc::now();
        self.vendors.update(vendor).await?;

        self.audit
            .append(
                AuditLevel::Info,
                "Provisioning group created",
                Some(&vendor.id),
                Some(serde_json::json!({ "group_id": group_id.to_string() })),
            )
            .await?;
        Ok(())
    }

    /// Ensures the vendor has an administrator account bound to `email`.
    ///
    /// Reuses an existing account when one matches; otherwise creates one
    /// with a one-time password and forced change. The vendor's admin
    /// binding is only written when currently empty. The role assignment
    /// and group membership are re-applied idempotently. A welcome mail
    /// goes out only when the account was newly created and the vendor is
    /// currently active.
    pub async fn ensure_administrator(
        &self,
        vendor: &mut Vendor,
        email: &str,
    ) -> Result<(), DomainError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(());
        }

        let (account, created, password) = match self.users.find_by_email(&email).await? {
            Some(account) => (account, false, None),
            None => {
                let password = generate_password();
                let account = self
                    .users
                    .create_account(NewAccount {
                        email: email.clone(),
                        username: email.clone(),
                        first_name: vendor.org_name.clone(),
                        last_name: "Administrator".to_string(),
                        initial_password: password.clone(),
                    })
                    .await?;
                self.audit
                    .append(
                        AuditLevel::Info,
                        "Vendor administrator account created",
                        Some(&vendor.id),
                        Some(serde_json::json!({ "user_id": account.id.to_string() })),
                    )
                    .await?;
                (account, true, Some(password))
            }
        };

        let mut vendor_changed = false;
        if vendor.admin_user_id.is_none() {
            vendor.admin_user_id = Some(account.id);
            vendor_changed = true;
        }
        if vendor.admin_email.as_deref().unwrap_or("").is_empty() {
            vendor.admin_email = Some(email.clone());
            vendor_changed = true;
        }
        if vendor_changed {
            vendor.updated_at = chrono::Utc::now();
            self.vendors.update(vendor).await?;
        }

        self.users.assign_role(&account.id, VENDOR_ADMIN_ROLE).await?;

        self.ensure_group(vendor).await?;
        if let Some(group_id) = vendor.group_id {
            self.users.add_group_member(&group_id, &account.id).await?;
        }

        if created && vendor.status.is_active() {
            if let Some(password) = password {
                self.mailer
                    .send_admin_welcome(vendor, &account, &password)
                    .await?;
            }
        }
        Ok(())
    }

    /// Occupied seats: non-suspended group members, the admin excluded.
    pub async fn seat_usage(&self, vendor: &Vendor) -> Result<u32, DomainError> {
        let Some(group_id) = vendor.group_id else {
            return Ok(0);
        };
        let members = self.users.group_members(&group_id).await?;
        let used = members
            .iter()
            .filter(|m| !m.suspended && Some(m.id) != vendor.admin_user_id)
            .count();
        Ok(used as u32)
    }

    /// Seats still available; `None` when the vendor has no limit.
    pub async fn seats_remaining(&self, vendor: &Vendor) -> Result<Option<u32>, DomainError> {
        if vendor.seat_limit == 0 {
            return Ok(None);
        }
        let used = self.seat_usage(vendor).await?;
        Ok(Some(vendor.seat_limit.saturating_sub(used)))
    }

    /// Provisions a member account through the portal.
    ///
    /// The seat check comes first so a full vendor is rejected with no
    /// partial state. Email and username collisions are rejected before
    /// any write.
    pub async fn create_user(
        &self,
        vendor: &mut Vendor,
        request: NewVendorUser,
    ) -> Result<Account, BillingError> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(BillingError::MissingEmail);
        }

        if self.seats_remaining(vendor).await? == Some(0) {
            return Err(BillingError::SeatLimitExceeded);
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(BillingError::EmailInUse);
        }
        let username = request
            .username
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| email.clone());
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(BillingError::UsernameInUse);
        }

        let password = generate_password();
        let account = self
            .users
            .create_account(NewAccount {
                email,
                username,
                first_name: request.first_name,
                last_name: request.last_name,
                initial_password: password.clone(),
            })
            .await?;

        self.ensure_group(vendor).await?;
        if let Some(group_id) = vendor.group_id {
            self.users.add_group_member(&group_id, &account.id).await?;
        }

        self.audit
            .append(
                AuditLevel::Info,
                "Vendor user provisioned",
                Some(&vendor.id),
                Some(serde_json::json!({ "user_id": account.id.to_string() })),
            )
            .await?;

        self.mailer
            .send_user_welcome(vendor, &account, &password)
            .await?;
        Ok(account)
    }

    /// Suspends or reactivates a single member from the portal.
    pub async fn set_member_suspension(
        &self,
        vendor: &Vendor,
        user_id: &UserId,
        suspended: bool,
    ) -> Result<(), BillingError> {
        self.guard_member_op(vendor, user_id).await?;
        self.users.set_suspended(user_id, suspended).await?;
        self.audit
            .append(
                AuditLevel::Info,
                if suspended {
                    "Vendor user suspended"
                } else {
                    "Vendor user reactivated"
                },
                Some(&vendor.id),
                Some(serde_json::json!({ "user_id": user_id.to_string() })),
            )
            .await?;
        Ok(())
    }

    /// Applies profile changes to a member, rejecting collisions with
    /// other accounts.
    pub async fn update_member(
        &self,
        vendor: &Vendor,
        user_id: &UserId,
        update: MemberUpdate,
    ) -> Result<Account, BillingError> {
        self.guard_member_op(vendor, user_id).await?;

        let mut account = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::not_found("user"))?;

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if email.is_empty() {
                return Err(BillingError::MissingEmail);
            }
            if let Some(other) = self.users.find_by_email(&email).await? {
                if other.id != account.id {
                    return Err(BillingError::EmailInUse);
                }
            }
            account.email = email;
        }
        if let Some(username) = update.username {
            let username = username.trim().to_lowercase();
            if let Some(other) = self.users.find_by_username(&username).await? {
                if other.id != account.id {
                    return Err(BillingError::UsernameInUse);
                }
            }
            account.username = username;
        }
        if let Some(first_name) = update.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            account.last_name = last_name;
        }

        self.users.update_account(&account).await?;
        Ok(account)
    }

    /// Removes a member account from the portal.
    pub async fn delete_member(
        &self,
        vendor: &Vendor,
        user_id: &UserId,
    ) -> Result<(), BillingError> {
        self.guard_member_op(vendor, user_id).await?;
        self.users.delete_account(user_id).await?;
        self.audit
            .append(
                AuditLevel::Info,
                "Vendor user deleted",
                Some(&vendor.id),
                Some(serde_json::json!({ "user_id": user_id.to_string() })),
            )
            .await?;
        Ok(())
    }

    /// Common gate for member management: the vendor must be active, the
    /// admin account is off limits, and the target must belong to the
    /// vendor's group.
    async fn guard_member_op(
        &self,
        vendor: &Vendor,
        user_id: &UserId,
    ) -> Result<(), BillingError> {
        if !vendor.status.is_active() {
            return Err(BillingError::VendorInactive);
        }
        if vendor.admin_user_id.as_ref() == Some(user_id) {
            return Err(BillingError::AdminProtected);
        }
        let Some(group_id) = vendor.group_id else {
            return Err(BillingError::NotAVendorMember);
        };
        if !self.users.is_group_member(&group_id, user_id).await? {
            return Err(BillingError::NotAVendorMember);
        }
        Ok(())
    }
}

/// One-time password for a freshly created account; the directory forces a
/// change at first login.
fn generate_password() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("V!{}", &raw[..14])
}
