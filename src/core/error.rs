use axum::BoxError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("Invalid header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found")]
    NotFound,
    #[error("User already exists")]
    AlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Report has not been claimed by any user")]
    InvalidReport,
    #[error("Report {report_id} was already purchased")]
    PurchaseConflict { report_id: String },
    #[error(
        "Report {report_id}: {conflict}; rolling back {amount} for user {identity_id} failed: {rollback}"
    )]
    CompensationFailed {
        report_id: String,
        identity_id: Uuid,
        amount: Decimal,
        conflict: String,
        #[source]
        rollback: StoreError,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to create user: {0}")]
    CreationFailed(#[source] StoreError),
    #[error("Failed to credit balance: {0}")]
    CreditFailed(#[source] StoreError),
    #[error("Failed to {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Bcrypt error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Internal server error")]
    Internal,
}

impl Error {
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Error::Store { operation, source }
    }

    /// True for the one outcome that leaves the ledger and catalog out of
    /// step and needs an operator to reconcile them.
    pub(crate) fn requires_reconciliation(&self) -> bool {
        matches!(self, Error::CompensationFailed { .. })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.requires_reconciliation() {
            tracing::error!(reconciliation_required = true, "{}", self);
        } else {
            tracing::error!("{:?}", self);
        }

        let (status, message) = match self {
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            Error::AlreadyExists => (StatusCode::CONFLICT, "Already exists"),
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Error::InvalidReport => (StatusCode::UNPROCESSABLE_ENTITY, "Report is not claimed"),
            Error::PurchaseConflict { .. } => {
                (StatusCode::CONFLICT, "Report was already purchased")
            }
            Error::CompensationFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Purchase failed and requires reconciliation",
            ),
            Error::Validation(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
            Error::CreationFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user"),
            Error::CreditFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to purchase report"),
            Error::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            Error::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Bcrypt error"),
            Error::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, message).into_response()
    }
}

pub(crate) async fn handle_middleware_errors(err: BoxError) -> (StatusCode, &'static str) {
    tracing::error!("Unhandled error: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
