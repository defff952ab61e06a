use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::types::user::Identity;

#[derive(Serialize)]
pub(crate) struct Login {
    pub(crate) username: String,
    pub(crate) token: String,
}

impl Login {
    pub(crate) fn new(username: &str, token: &str) -> Self {
        Self {
            username: username.to_string(),
            token: token.to_string(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct User {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) balance: Decimal,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Identity> for User {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            email: identity.email,
            balance: identity.balance,
            created_at: identity.created_at,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct AuthCheck {
    pub(crate) status: &'static str,
    pub(crate) username: String,
}

#[derive(Serialize)]
pub(crate) struct Claimed {
    pub(crate) claimed: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct PurchaseReceipt {
    pub(crate) report_id: String,
    pub(crate) identity_id: Uuid,
    pub(crate) price: Decimal,
}
