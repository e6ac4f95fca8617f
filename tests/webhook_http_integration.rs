//! End-to-end webhook tests over the HTTP endpoint.
//!
//! Each test signs a raw payload, posts it to the router, and asserts on
//! the response contract plus the resulting vendor, account, ledger, and
//! notification state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use vendor_billing::adapters::http::{webhook_router, WebhookAppState};
use vendor_billing::adapters::memory::{
    InMemoryAuditLog, InMemoryEventLedger, InMemoryUserDirectory, InMemoryVendorRepository,
    RecordingNotifier,
};
use vendor_billing::application::{
    EventProcessor, Mailer, ProcessWebhookHandler, StatusReconciler, VendorDirectory,
};
use vendor_billing::config::{MessageTemplate, NotificationConfig};
use vendor_billing::domain::foundation::UserId;
use vendor_billing::domain::vendor::{PriceMap, VendorStatus};
use vendor_billing::domain::webhook::{SignatureVerifier, DEFAULT_TOLERANCE_SECS};
use vendor_billing::ports::{
    Account, AuditLevel, EventLedger, LedgerStatus, UserDirectory, VendorRepository,
};

const SECRET: &str = "whsec_integration_secret";

struct TestApp {
    app: Router,
    vendors: Arc<InMemoryVendorRepository>,
    users: Arc<InMemoryUserDirectory>,
    ledger: Arc<InMemoryEventLedger>,
    audit: Arc<InMemoryAuditLog>,
    notifier: Arc<RecordingNotifier>,
}

fn build_app() -> TestApp {
    let vendors = Arc::new(InMemoryVendorRepository::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let ledger = Arc::new(InMemoryEventLedger::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let mailer = Arc::new(Mailer::new(
        notifier.clone(),
        audit.clone(),
        NotificationConfig {
            admin_welcome: MessageTemplate {
                subject: "Welcome to {sitename}".to_string(),
                body: "Login as {username} with {password}".to_string(),
            },
            suspension: MessageTemplate {
                subject: "Access suspended for {vendorname}".to_string(),
                body: "Hello {email}".to_string(),
            },
            ..Default::default()
        },
    ));
    let directory = Arc::new(VendorDirectory::new(
        vendors.clone(),
        users.clone(),
        audit.clone(),
        mailer.clone(),
    ));
    let reconciler = Arc::new(StatusReconciler::new(
        vendors.clone(),
        users.clone(),
        audit.clone(),
        mailer,
    ));
    let price_map = PriceMap::from_json(
        r#"{"price_mapped": {"plan_code": "starter", "seat_limit": 2}}"#,
    )
    .unwrap();
    let processor = Arc::new(EventProcessor::new(
        directory,
        reconciler,
        audit.clone(),
        price_map,
    ));
    let webhook_handler = Arc::new(ProcessWebhookHandler::new(
        SignatureVerifier::new(SECRET, DEFAULT_TOLERANCE_SECS),
        ledger.clone(),
        processor,
        audit.clone(),
    ));

    TestApp {
        app: webhook_router(WebhookAppState { webhook_handler }),
        vendors,
        users,
        ledger,
        audit,
        notifier,
    }
}

fn signature_header(payload: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let mut mac =
        Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).expect("HMAC accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

async fn deliver(app: &Router, payload: &str, header: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/stripe")
                .header("stripe-signature", header)
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn checkout_event(event_id: &str) -> String {
    format!(
        r#"{{
            "id": "{event_id}",
            "type": "checkout.session.completed",
            "data": {{"object": {{
                "customer": "cus_1",
                "subscription": "sub_1",
                "payment_status": "paid",
                "customer_details": {{"email": "owner@acme.com", "name": "Acme Corp"}}
            }}}}
        }}"#
    )
}

fn subscription_event(event_id: &str, status: &str, price_id: &str, metadata: &str) -> String {
    format!(
        r#"{{
            "id": "{event_id}",
            "type": "customer.subscription.updated",
            "data": {{"object": {{
                "id": "sub_1",
                "customer": "cus_1",
                "status": "{status}",
                "items": {{"data": [{{"price": {{"id": "{price_id}", "metadata": {metadata}}}}}]}}
            }}}}
        }}"#
    )
}

/// Completed paid checkout: vendor activated, admin provisioned, welcome
/// mail delivered, ledger record processed.
#[tokio::test]
async fn paid_checkout_provisions_an_active_vendor() {
    let t = build_app();
    let payload = checkout_event("evt_checkout_1");

    let (status, body) = deliver(&t.app, &payload, &signature_header(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .expect("vendor created");
    assert_eq!(vendor.org_name, "Acme Corp");
    assert_eq!(vendor.status, VendorStatus::Active);
    assert_eq!(vendor.email_domain.as_deref(), Some("acme.com"));
    assert_eq!(vendor.admin_email.as_deref(), Some("owner@acme.com"));
    assert!(vendor.group_id.is_some());

    let admin = t
        .users
        .find_by_email("owner@acme.com")
        .await
        .unwrap()
        .expect("admin account created");
    assert_eq!(vendor.admin_user_id, Some(admin.id));
    assert!(t
        .users
        .is_group_member(&vendor.group_id.unwrap(), &admin.id)
        .await
        .unwrap());

    let sent = t.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient_email, "owner@acme.com");

    let record = t.ledger.find("evt_checkout_1").await.unwrap().unwrap();
    assert_eq!(record.status, LedgerStatus::Processed);
    assert!(record.processed_at.is_some());
}

/// Unpaid checkout leaves the vendor incomplete and sends no credentials.
#[tokio::test]
async fn unpaid_checkout_stays_incomplete() {
    let t = build_app();
    let payload = r#"{
        "id": "evt_checkout_2",
        "type": "checkout.session.completed",
        "data": {"object": {
            "customer": "cus_1",
            "subscription": "sub_1",
            "payment_status": "unpaid",
            "customer_details": {"email": "owner@acme.com", "name": "Acme Corp"}
        }}
    }"#;

    let (status, body) = deliver(&t.app, payload, &signature_header(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vendor.status, VendorStatus::Incomplete);
    assert!(t.notifier.sent().await.is_empty());
}

/// Subscription update applies plan metadata and enforces the seat limit,
/// evicting the newest members first.
#[tokio::test]
async fn subscription_update_applies_plan_and_evicts_newest() {
    let t = build_app();
    let checkout = checkout_event("evt_checkout_1");
    deliver(&t.app, &checkout, &signature_header(&checkout)).await;

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    let group = vendor.group_id.unwrap();

    // Three members, oldest first.
    let base = Utc::now() - Duration::hours(1);
    let mut member_ids = Vec::new();
    for i in 0..3 {
        let account = Account {
            id: UserId::new(),
            email: format!("member{i}@acme.com"),
            username: format!("member{i}@acme.com"),
            first_name: format!("Member{i}"),
            last_name: "Acme".to_string(),
            suspended: false,
            created_at: base + Duration::minutes(i),
        };
        t.users.insert_account(account.clone()).await;
        t.users.add_group_member(&group, &account.id).await.unwrap();
        member_ids.push(account.id);
    }

    let payload = subscription_event(
        "evt_sub_1",
        "active",
        "price_1",
        r#"{"plan_code": "team", "seat_limit": "1"}"#,
    );
    let (status, body) = deliver(&t.app, &payload, &signature_header(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vendor.plan_code.as_deref(), Some("team"));
    assert_eq!(vendor.seat_limit, 1);
    assert_eq!(vendor.stripe_price_id.as_deref(), Some("price_1"));

    // Oldest member keeps the single seat; the two newest are evicted.
    let mut flags = Vec::new();
    for id in &member_ids {
        flags.push(t.users.find_by_id(id).await.unwrap().unwrap().suspended);
    }
    assert_eq!(flags, vec![false, true, true]);
}

/// Plan attributes fall back to the configured price map when metadata
/// leaves them unset.
#[tokio::test]
async fn subscription_update_uses_price_map_fallback() {
    let t = build_app();
    let payload = subscription_event("evt_sub_2", "active", "price_mapped", "{}");

    let (status, _) = deliver(&t.app, &payload, &signature_header(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vendor.plan_code.as_deref(), Some("starter"));
    assert_eq!(vendor.seat_limit, 2);
}

/// A past_due subscription suspends every non-admin member and notifies
/// the admin once.
#[tokio::test]
async fn delinquent_subscription_suspends_members_and_notifies_admin() {
    let t = build_app();
    let checkout = checkout_event("evt_checkout_1");
    deliver(&t.app, &checkout, &signature_header(&checkout)).await;

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    let group = vendor.group_id.unwrap();
    let member = Account {
        id: UserId::new(),
        email: "member@acme.com".to_string(),
        username: "member@acme.com".to_string(),
        first_name: "Member".to_string(),
        last_name: "Acme".to_string(),
        suspended: false,
        created_at: Utc::now(),
    };
    t.users.insert_account(member.clone()).await;
    t.users.add_group_member(&group, &member.id).await.unwrap();

    let payload = subscription_event("evt_sub_3", "past_due", "price_1", "{}");
    let (status, body) = deliver(&t.app, &payload, &signature_header(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vendor.status, VendorStatus::PastDue);
    assert!(t.users.find_by_id(&member.id).await.unwrap().unwrap().suspended);
    // Admin is exempt from the cascade.
    let admin_id = vendor.admin_user_id.unwrap();
    assert!(!t.users.find_by_id(&admin_id).await.unwrap().unwrap().suspended);

    let sent = t.notifier.sent().await;
    let suspension: Vec<_> = sent
        .iter()
        .filter(|m| m.subject.contains("suspended"))
        .collect();
    assert_eq!(suspension.len(), 1);
    assert_eq!(suspension[0].recipient_email, "owner@acme.com");
}

/// Events for vendors we have no record of are acknowledged with a
/// warning so the provider stops retrying.
#[tokio::test]
async fn invoice_for_unknown_vendor_is_acknowledged() {
    let t = build_app();
    let payload = r#"{
        "id": "evt_inv_1",
        "type": "invoice.payment_failed",
        "data": {"object": {"customer": "cus_missing", "subscription": "sub_missing"}}
    }"#;

    let (status, body) = deliver(&t.app, payload, &signature_header(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let record = t.ledger.find("evt_inv_1").await.unwrap().unwrap();
    assert_eq!(record.status, LedgerStatus::Processed);

    let warnings = t.audit.messages_at(AuditLevel::Warning).await;
    assert!(warnings.iter().any(|m| m.contains("unknown vendor")));
}

/// A failed invoice demotes an existing vendor to past_due.
#[tokio::test]
async fn failed_invoice_demotes_vendor() {
    let t = build_app();
    let checkout = checkout_event("evt_checkout_1");
    deliver(&t.app, &checkout, &signature_header(&checkout)).await;

    let payload = r#"{
        "id": "evt_inv_2",
        "type": "invoice.payment_failed",
        "data": {"object": {"customer": "cus_1", "subscription": "sub_1", "status": "draft"}}
    }"#;
    deliver(&t.app, payload, &signature_header(payload)).await;

    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    // "draft" is not a delinquency status, so past_due applies.
    assert_eq!(vendor.status, VendorStatus::PastDue);
}

/// Second delivery of the same event ID is absorbed without re-applying
/// side effects.
#[tokio::test]
async fn duplicate_delivery_is_ignored() {
    let t = build_app();
    let payload = checkout_event("evt_checkout_1");
    let header = signature_header(&payload);

    let (first_status, first_body) = deliver(&t.app, &payload, &header).await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first_body, "OK");
    let mail_count = t.notifier.sent().await.len();
    let audit_count = t.audit.entries().await.len();

    let (second_status, second_body) = deliver(&t.app, &payload, &header).await;
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(second_body, "Duplicate event ignored.");

    assert_eq!(t.notifier.sent().await.len(), mail_count);
    assert_eq!(t.audit.entries().await.len(), audit_count);
}

/// Simultaneous deliveries of the same event race through the ledger
/// gate; exactly one processes, the other is absorbed as a duplicate.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_duplicate_deliveries_process_once() {
    let t = build_app();
    let payload = checkout_event("evt_checkout_1");
    let header = signature_header(&payload);

    let spawn_delivery = |app: Router, payload: String, header: String| {
        tokio::spawn(async move { deliver(&app, &payload, &header).await })
    };
    let first = spawn_delivery(t.app.clone(), payload.clone(), header.clone());
    let second = spawn_delivery(t.app.clone(), payload, header);
    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    let mut bodies = vec![first.1, second.1];
    bodies.sort();
    assert_eq!(bodies, vec!["Duplicate event ignored.", "OK"]);

    // One ledger record, one provisioning pass, one welcome mail.
    let record = t.ledger.find("evt_checkout_1").await.unwrap().unwrap();
    assert_eq!(record.status, LedgerStatus::Processed);
    let vendor = t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(vendor.status, VendorStatus::Active);
    assert_eq!(t.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn bad_signature_is_rejected_before_any_effect() {
    let t = build_app();
    let payload = checkout_event("evt_checkout_1");

    let (status, body) = deliver(&t.app, &payload, "t=123,v1=deadbeef").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "signature verification failed");

    assert!(t.ledger.find("evt_checkout_1").await.unwrap().is_none());
    assert!(t
        .vendors
        .find_by_subscription_id("sub_1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let t = build_app();
    let payload = checkout_event("evt_checkout_1");
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/stripe")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparseable_payload_is_rejected() {
    let t = build_app();

    let not_json = "{not json";
    let (status, body) = deliver(&t.app, not_json, &signature_header(not_json)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "payload could not be parsed");

    let no_id = r#"{"type": "invoice.paid"}"#;
    let (status, body) = deliver(&t.app, no_id, &signature_header(no_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "payload could not be parsed");
}

/// Unknown event types are acknowledged and logged, nothing else.
#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let t = build_app();
    let payload = r#"{"id": "evt_misc_1", "type": "customer.created", "data": {"object": {}}}"#;

    let (status, body) = deliver(&t.app, payload, &signature_header(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let record = t.ledger.find("evt_misc_1").await.unwrap().unwrap();
    assert_eq!(record.status, LedgerStatus::Processed);
    let infos = t.audit.messages_at(AuditLevel::Info).await;
    assert!(infos.iter().any(|m| m.contains("Unhandled event type")));
}
