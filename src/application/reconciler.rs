//! Status reconciliation and seat-limit enforcement.
//!
//! `set_status` is the single entry point for subscription-status changes
//! and cascades them onto the vendor's member accounts:
//!
//! - vendor becomes active: every non-admin member is reactivated, then
//!   the seat limit is enforced
//! - vendor becomes inactive: every non-admin member is suspended and, if
//!   the vendor was active before, the admin gets a suspension notice
//!
//! Seat enforcement evicts newest accounts first and restores oldest
//! suspended accounts first. The admin account is never counted against
//! the limit and never auto-suspended.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::vendor::{Vendor, VendorStatus};
use crate::ports::{Account, AuditLevel, AuditLog, UserDirectory, VendorRepository};

use super::notifications::Mailer;

pub struct StatusReconciler {
    vendors: Arc<dyn VendorRepository>,
    users: Arc<dyn UserDirectory>,
    audit: Arc<dyn AuditLog>,
    mailer: Arc<Mailer>,
}

impl StatusReconciler {
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

    /// Persists the new status and cascades it onto member accounts.
    ///
    /// A failure on one member does not stop the cascade; each failed
    /// suspension toggle is audit-logged and the remaining members are
    /// still processed.
    pub async fn set_status(
        &self,
        vendor: &mut Vendor,
        new_status: VendorStatus,
    ) -> Result<(), DomainError> {
        let was_active = vendor.status.is_active();

        vendor.status = new_status;
        vendor.updated_at = chrono::Utc::now();
        self.vendors.update(vendor).await?;

        tracing::info!(
            vendor_id = %vendor.id,
            status = %new_status,
            was_active,
            "vendor status changed"
        );

        if new_status.is_active() {
            self.set_all_members_suspended(vendor, false).await?;
            self.enforce_seat_limit(vendor).await?;
        } else {
            self.set_all_members_suspended(vendor, true).await?;
            if was_active {
                self.notify_admin_of_suspension(vendor).await?;
            }
        }
        Ok(())
    }

    /// Brings member suspension in line with the seat limit.
    ///
    /// Only applies to active vendors with a group and a nonzero limit.
    /// Over capacity, the newest active accounts are suspended until the
    /// count fits. Under capacity, the oldest suspended accounts are
    /// reactivated while seats remain.
    pub async fn enforce_seat_limit(&self, vendor: &Vendor) -> Result<(), DomainError> {
        if !vendor.status.is_active() || vendor.seat_limit == 0 {
            return Ok(());
        }
        let Some(group_id) = vendor.group_id else {
            return Ok(());
        };

        let members = self.users.group_members(&group_id).await?;
        let mut active: Vec<&Account> = Vec::new();
        let mut suspended: Vec<&Account> = Vec::new();
        for member in members
            .iter()
            .filter(|m| Some(m.id) != vendor.admin_user_id)
        {
            if member.suspended {
                suspended.push(member);
            } else {
                active.push(member);
            }
        }

        let limit = vendor.seat_limit as usize;
        if active.len() > limit {
            // Newest in, first out.
            active.sort_by_key(|m| std::cmp::Reverse(m.created_at));
            let over = active.len() - limit;
            for member in active.into_iter().take(over) {
                self.toggle_member(vendor, member, true, "Seat limit eviction")
                    .await?;
            }
        } else if active.len() < limit && !suspended.is_empty() {
            // Oldest suspended comes back first.
            suspended.sort_by_key(|m| m.created_at);
            let free = limit - active.len();
            for member in suspended.into_iter().take(free) {
                self.toggle_member(vendor, member, false, "Seat limit restoration")
                    .await?;
            }
        }
        Ok(())
    }

    async fn set_all_members_suspended(
        &self,
        vendor: &Vendor,
        suspended: bool,
    ) -> Result<(), DomainError> {
        let Some(group_id) = vendor.group_id else {
            return Ok(());
        };
        let members = self.users.group_members(&group_id).await?;
        // Members already in the target state are left alone.
        for member in members
            .iter()
            .filter(|m| Some(m.id) != vendor.admin_user_id && m.suspended != suspended)
        {
            let reason = if suspended {
                "Vendor suspension cascade"
            } else {
                "Vendor reactivation cascade"
            };
            self.toggle_member(vendor, member, suspended, reason).await?;
        }
        Ok(())
    }

    /// Flips one member's suspension flag. Port failures are recorded and
    /// swallowed so the rest of the cascade proceeds; the partial state is
    /// visible in the audit log.
    async fn toggle_member(
        &self,
        vendor: &Vendor,
        member: &Account,
        suspended: bool,
        reason: &str,
    ) -> Result<(), DomainError> {
        match self.users.set_suspended(&member.id, suspended).await {
            Ok(()) => {
                self.audit
                    .append(
                        AuditLevel::Info,
                        reason,
                        Some(&vendor.id),
                        Some(serde_json::json!({
                            "user_id": member.id.to_string(),
                            "suspended": suspended,
                        })),
                    )
                    .await
            }
            Err(err) => {
                tracing::warn!(
                    vendor_id = %vendor.id,
                    user_id = %member.id,
                    error = %err,
                    "failed to toggle member suspension"
                );
                self.audit
                    .append(
                        AuditLevel::Error,
                        &format!("{reason} failed: {err}"),
                        Some(&vendor.id),
                        Some(serde_json::json!({
                            "user_id": member.id.to_string(),
                            "suspended": suspended,
                        })),
                    )
                    .await
            }
        }
    }

    async fn notify_admin_of_suspension(&self, vendor: &Vendor) -> Result<(), DomainError> {
        let Some(admin_id) = vendor.admin_user_id else {
            return Ok(());
        };
        match self.users.find_by_id(&admin_id).await? {
            Some(account) => self.mailer.send_suspension_notice(vendor, &account).await,
            None => {
                tracing::warn!(vendor_id = %vendor.id, "admin account missing, suspension notice skipped");
                Ok(())
            }
        }
    }
}
