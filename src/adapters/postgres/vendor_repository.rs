//! PostgreSQL implementation of VendorRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, GroupId, UserId, VendorId};
use crate::domain::vendor::{Vendor, VendorStatus};
use crate::ports::VendorRepository;

use super::storage_error;

pub struct PostgresVendorRepository {
    pool: PgPool,
}

impl PostgresVendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        let query = format!("{SELECT_VENDOR} WHERE {column} = $1");
        let row: Option<VendorRow> = sqlx::query_as(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        row.map(Vendor::try_from).transpose()
    }
}

const SELECT_VENDOR: &str = "SELECT id, org_name, email_domain, stripe_customer_id, \
     stripe_subscription_id, stripe_price_id, plan_code, seat_limit, status, \
     admin_user_id, admin_email, group_id, created_at, updated_at FROM vendors";

/// Database row representation of a vendor.
#[derive(Debug, sqlx::FromRow)]
struct VendorRow {
    id: Uuid,
    org_name: String,
    email_domain: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    stripe_price_id: Option<String>,
    plan_code: Option<String>,
    seat_limit: i32,
    status: String,
    admin_user_id: Option<Uuid>,
    admin_email: Option<String>,
    group_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VendorRow> for Vendor {
    type Error = DomainError;

    fn try_from(row: VendorRow) -> Result<Self, Self::Error> {
        let status = VendorStatus::parse(&row.status).ok_or_else(|| {
            DomainError::storage(format!("invalid vendor status value: {}", row.status))
        })?;
        Ok(Vendor {
            id: VendorId::from_uuid(row.id),
            org_name: row.org_name,
            email_domain: row.email_domain,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            stripe_price_id: row.stripe_price_id,
            plan_code: row.plan_code,
            seat_limit: row.seat_limit.max(0) as u32,
            status,
            admin_user_id: row.admin_user_id.map(UserId::from_uuid),
            admin_email: row.admin_email,
            group_id: row.group_id.map(GroupId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl VendorRepository for PostgresVendorRepository {
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, DomainError> {
        let query = format!("{SELECT_VENDOR} WHERE id = $1");
        let row: Option<VendorRow> = sqlx::query_as(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        row.map(Vendor::try_from).transpose()
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        self.find_one("stripe_subscription_id", subscription_id).await
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        self.find_one("stripe_customer_id", customer_id).await
    }

    async fn find_by_admin_email(&self, email: &str) -> Result<Option<Vendor>, DomainError> {
        self.find_one("admin_email", email).await
    }

    async fn insert(&self, vendor: &Vendor) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO vendors (id, org_name, email_domain, stripe_customer_id, \
             stripe_subscription_id, stripe_price_id, plan_code, seat_limit, status, \
             admin_user_id, admin_email, group_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(vendor.id.as_uuid())
        .bind(&vendor.org_name)
        .bind(&vendor.email_domain)
        .bind(&vendor.stripe_customer_id)
        .bind(&vendor.stripe_subscription_id)
        .bind(&vendor.stripe_price_id)
        .bind(&vendor.plan_code)
        .bind(vendor.seat_limit as i32)
        .bind(vendor.status.as_str())
        .bind(vendor.admin_user_id.map(|id| id.as_uuid()))
        .bind(&vendor.admin_email)
        .bind(vendor.group_id.map(|id| id.as_uuid()))
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn update(&self, vendor: &Vendor) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE vendors SET org_name = $2, email_domain = $3, stripe_customer_id = $4, \
             stripe_subscription_id = $5, stripe_price_id = $6, plan_code = $7, \
             seat_limit = $8, status = $9, admin_user_id = $10, admin_email = $11, \
             group_id = $12, updated_at = $13 WHERE id = $1",
        )
        .bind(vendor.id.as_uuid())
        .bind(&vendor.org_name)
        .bind(&vendor.email_domain)
        .bind(&vendor.stripe_customer_id)
        .bind(&vendor.stripe_subscription_id)
        .bind(&vendor.stripe_price_id)
        .bind(&vendor.plan_code)
        .bind(vendor.seat_limit as i32)
        .bind(vendor.status.as_str())
        .bind(vendor.admin_user_id.map(|id| id.as_uuid()))
        .bind(&vendor.admin_email)
        .bind(vendor.group_id.map(|id| id.as_uuid()))
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("vendor"));
        }
        Ok(())
    }
}
