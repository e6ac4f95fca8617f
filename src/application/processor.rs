//! Per-event-type webhook dispatch.
//!
//! Each handled event mutates the vendor directory and, where the event
//! carries a subscription status, runs the status reconciler. Events for
//! unknown vendors are warnings, not failures: the processor acknowledges
//! them so the provider stops retrying. Every branch leaves an audit
//! entry.

use std::sync::Arc;

use std::collections::HashMap;

use crate::domain::vendor::{email_domain, BillingError, PriceMap, VendorPatch, VendorStatus};
use crate::domain::webhook::{CheckoutSession, EventKind, Invoice, Subscription, WebhookEvent};
use crate::ports::{AuditLevel, AuditLog};

use super::directory::VendorDirectory;
use super::reconciler::StatusReconciler;

pub struct EventProcessor {
    directory: Arc<VendorDirectory>,
    reconciler: Arc<StatusReconciler>,
    audit: Arc<dyn AuditLog>,
    price_map: PriceMap,
}

impl EventProcessor {
    pub fn new(
        directory: Arc<VendorDirectory>,
        reconciler: Arc<StatusReconciler>,
        audit: Arc<dyn AuditLog>,
        price_map: PriceMap,
    ) -> Self {
        Self {
            directory,
            reconciler,
            audit,
            price_map,
        }
    }

    pub async fn process(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        match event.kind() {
            EventKind::CheckoutSessionCompleted => self.handle_checkout_completed(event).await,
            EventKind::SubscriptionCreated | EventKind::SubscriptionUpdated => {
                self.handle_subscription_updated(event).await
            }
            EventKind::SubscriptionDeleted => self.handle_subscription_deleted(event).await,
            EventKind::InvoicePaid | EventKind::InvoicePaymentSucceeded => {
                self.handle_invoice_paid(event).await
            }
            EventKind::InvoicePaymentFailed => self.handle_invoice_failed(event).await,
            EventKind::Unknown => {
                tracing::info!(event_id = %event.id, event_type = %event.event_type, "unhandled event type");
                self.audit
                    .append(
                        AuditLevel::Info,
                        &format!("Unhandled event type: {}", event.event_type),
                        None,
                        Some(serde_json::json!({ "event_id": event.id })),
                    )
                    .await?;
                Ok(())
            }
        }
    }

    /// A completed checkout establishes (or refreshes) the vendor and, on a
    /// settled payment, activates it.
    async fn handle_checkout_completed(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        let session: CheckoutSession = event.object();

        let email = session.email().map(str::to_string);
        let status = if session.is_paid() {
            VendorStatus::Active
        } else {
            VendorStatus::Incomplete
        };

        let patch = VendorPatch {
            org_name: Some(session.org_name().unwrap_or("Vendor").to_string()),
            email_domain: email.as_deref().and_then(email_domain),
            stripe_customer_id: session.customer.clone(),
            stripe_subscription_id: session.subscription.clone(),
            status: Some(status),
            admin_email: email.clone(),
            ..Default::default()
        };

        let mut vendor = self.directory.upsert(patch).await?;
        self.directory.ensure_group(&mut vendor).await?;
        if let Some(email) = email.as_deref() {
            self.directory
                .ensure_administrator(&mut vendor, email)
                .await?;
        }
        if status.is_active() {
            self.reconciler.set_status(&mut vendor, status).await?;
        }

        self.audit
            .append(
                AuditLevel::Info,
                "Checkout session completed",
                Some(&vendor.id),
                Some(serde_json::json!({
                    "event_id": event.id,
                    "status": status.as_str(),
                })),
            )
            .await?;
        Ok(())
    }

    /// Subscription create/update events carry the authoritative plan and
    /// status; both are applied and the status cascade always runs.
    async fn handle_subscription_updated(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        let subscription: Subscription = event.object();

        let price = subscription.first_price();
        let empty: HashMap<String, String> = HashMap::new();
        let plan = self.price_map.resolve(
            price.and_then(|p| p.id.as_deref()),
            price.map(|p| &p.metadata).unwrap_or(&empty),
            &subscription.metadata,
        );
        let status = subscription
            .status
            .as_deref()
            .map(VendorStatus::from_processor)
            .unwrap_or(VendorStatus::Incomplete);

        // Status stays out of the patch: the reconciler persists it and
        // must see the prior status to decide on the suspension notice.
        let patch = VendorPatch {
            stripe_customer_id: subscription.customer.clone(),
            stripe_subscription_id: subscription.id.clone(),
            stripe_price_id: price.and_then(|p| p.id.clone()),
            plan_code: plan.plan_code.clone(),
            seat_limit: Some(plan.seat_limit),
            ..Default::default()
        };

        let mut vendor = self.directory.upsert(patch).await?;
        self.directory.ensure_group(&mut vendor).await?;
        self.reconciler.set_status(&mut vendor, status).await?;

        self.audit
            .append(
                AuditLevel::Info,
                "Subscription updated",
                Some(&vendor.id),
                Some(serde_json::json!({
                    "event_id": event.id,
                    "status": status.as_str(),
                    "plan_code": plan.plan_code,
                    "seat_limit": plan.seat_limit,
                })),
            )
            .await?;
        Ok(())
    }

    async fn handle_subscription_deleted(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        let subscription: Subscription = event.object();
        let Some(mut vendor) = self
            .directory
            .find_by_processor_ids(
                subscription.id.as_deref(),
                subscription.customer.as_deref(),
            )
            .await?
        else {
            return self.unknown_vendor(event).await;
        };

        self.reconciler
            .set_status(&mut vendor, VendorStatus::Canceled)
            .await?;
        self.audit
            .append(
                AuditLevel::Info,
                "Subscription deleted",
                Some(&vendor.id),
                Some(serde_json::json!({ "event_id": event.id })),
            )
            .await?;
        Ok(())
    }

    async fn handle_invoice_paid(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        let invoice: Invoice = event.object();
        let Some(mut vendor) = self
            .directory
            .find_by_processor_ids(invoice.subscription.as_deref(), invoice.customer.as_deref())
            .await?
        else {
            return self.unknown_vendor(event).await;
        };

        self.reconciler
            .set_status(&mut vendor, VendorStatus::Active)
            .await?;
        self.audit
            .append(
                AuditLevel::Info,
                "Invoice paid",
                Some(&vendor.id),
                Some(serde_json::json!({ "event_id": event.id })),
            )
            .await?;
        Ok(())
    }

    /// A failed invoice demotes the vendor. The invoice's own status is
    /// honored when it is one of the delinquency states, otherwise
    /// `past_due` applies.
    async fn handle_invoice_failed(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        let invoice: Invoice = event.object();
        let Some(mut vendor) = self
            .directory
            .find_by_processor_ids(invoice.subscription.as_deref(), invoice.customer.as_deref())
            .await?
        else {
            return self.unknown_vendor(event).await;
        };

        let status = invoice
            .status
            .as_deref()
            .and_then(VendorStatus::parse)
            .filter(|s| matches!(s, VendorStatus::PastDue | VendorStatus::Unpaid))
            .unwrap_or(VendorStatus::PastDue);

        self.reconciler.set_status(&mut vendor, status).await?;
        self.audit
            .append(
                AuditLevel::Info,
                "Invoice payment failed",
                Some(&vendor.id),
                Some(serde_json::json!({
                    "event_id": event.id,
                    "status": status.as_str(),
                })),
            )
            .await?;
        Ok(())
    }

    /// Events for vendors we have no record of are acknowledged so the
    /// provider stops retrying; the delivery is still audit-logged.
    async fn unknown_vendor(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        tracing::warn!(event_id = %event.id, event_type = %event.event_type, "event for unknown vendor");
        self.audit
            .append(
                AuditLevel::Warning,
                &format!("Event for unknown vendor: {}", event.event_type),
                None,
                Some(serde_json::json!({ "event_id": event.id })),
            )
            .await?;
        Ok(())
    }
}
