use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Report {
    pub(crate) client_generated_id: String,
    pub(crate) identity_id: Option<Uuid>,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) report_id: String,
    pub(crate) purchased: bool,
    pub(crate) price: Decimal,
}

impl Report {
    /// A fresh, unclaimed and unpurchased report.
    pub(crate) fn anonymous(
        client_generated_id: String,
        report_id: String,
        description: String,
        price: Decimal,
    ) -> Self {
        Self {
            client_generated_id,
            identity_id: None,
            description,
            created_at: Utc::now(),
            report_id,
            purchased: false,
            price,
        }
    }
}

/// Shape of a report in the `reports` collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct ReportDocument {
    pub(crate) client_generated_id: String,
    pub(crate) user_id: Option<String>,
    pub(crate) description: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) report_id: String,
    pub(crate) is_purchased: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) price: Decimal,
}

impl From<&Report> for ReportDocument {
    fn from(report: &Report) -> Self {
        Self {
            client_generated_id: report.client_generated_id.clone(),
            user_id: report.identity_id.map(|id| id.to_string()),
            description: report.description.clone(),
            created_at: report.created_at,
            report_id: report.report_id.clone(),
            is_purchased: report.purchased,
            price: report.price,
        }
    }
}

impl TryFrom<ReportDocument> for Report {
    type Error = StoreError;

    fn try_from(document: ReportDocument) -> Result<Self, Self::Error> {
        let identity_id = document
            .user_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| {
                StoreError::Malformed(format!(
                    "report {} has invalid user_id: {e}",
                    document.report_id
                ))
            })?;

        Ok(Self {
            client_generated_id: document.client_generated_id,
            identity_id,
            description: document.description,
            created_at: document.created_at,
            report_id: document.report_id,
            purchased: document.is_purchased,
            price: document.price,
        })
    }
}
