use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::report::Report;
use crate::types::user::Identity;

#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod mongo;
pub(crate) mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate record")]
    Duplicate,
    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// Relational side of the system: identities and their balances.
#[async_trait]
pub(crate) trait IdentityStore: Send + Sync {
    async fn create(&self, identity: &Identity) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    /// Rewrites username, email and password hash, bumping `updated_at`.
    async fn update(&self, identity: &Identity) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<Identity>, StoreError>;

    async fn exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Adds `delta` (which may be negative) to the stored balance.
    async fn adjust_balance(&self, id: Uuid, delta: Decimal) -> Result<(), StoreError>;
}

/// Document side of the system: purchasable reports.
#[async_trait]
pub(crate) trait CatalogStore: Send + Sync {
    async fn create(&self, report: &Report) -> Result<(), StoreError>;

    async fn list_by_identity(&self, identity_id: Uuid) -> Result<Vec<Report>, StoreError>;

    /// Binds every still-unclaimed report carrying `client_generated_id` to
    /// `identity_id`. Returns the number of reports claimed.
    async fn claim_anonymous(
        &self,
        client_generated_id: &str,
        identity_id: Uuid,
    ) -> Result<u64, StoreError>;

    async fn lookup_owner_and_price(
        &self,
        report_id: &str,
    ) -> Result<Option<(Option<Uuid>, Decimal)>, StoreError>;

    /// Compare-and-set of the purchased flag from false to true. Returns the
    /// number of matched reports, zero when the report is already purchased
    /// or gone.
    async fn mark_purchased(&self, report_id: &str) -> Result<u64, StoreError>;
}
