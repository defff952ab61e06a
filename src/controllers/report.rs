use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::core::error::Error;
use crate::store::{CatalogStore, StoreError};
use crate::types::report::Report;
use crate::types::request::NewReport;

const MAX_DESCRIPTION_LENGTH: usize = 4096;

#[derive(Clone)]
pub(crate) struct ReportController {
    reports: Arc<dyn CatalogStore>,
}

impl ReportController {
    pub(crate) fn new(reports: Arc<dyn CatalogStore>) -> Self {
        Self { reports }
    }

    /// Stores an anonymous, unpurchased report.
    #[instrument(skip(self))]
    pub(crate) async fn create(&self, params: NewReport) -> Result<Report, Error> {
        if params.client_generated_id.trim().is_empty() {
            return Err(Error::Validation("client_generated_id is required".into()));
        }

        if params.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        if params.price < Decimal::ZERO {
            return Err(Error::Validation("price must not be negative".into()));
        }

        let report_id = match params.report_id {
            Some(report_id) if report_id.trim().is_empty() => {
                return Err(Error::Validation("report_id must not be blank".into()));
            }
            Some(report_id) => report_id,
            None => Uuid::new_v4().to_string(),
        };

        let report = Report::anonymous(
            params.client_generated_id,
            report_id,
            params.description,
            params.price,
        );

        match self.reports.create(&report).await {
            Ok(()) => Ok(report),
            Err(StoreError::Duplicate) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::store("create report")(e)),
        }
    }

    #[instrument(skip(self))]
    pub(crate) async fn list_for_identity(&self, identity_id: Uuid) -> Result<Vec<Report>, Error> {
        self.reports
            .list_by_identity(identity_id)
            .await
            .map_err(Error::store("list reports"))
    }

    /// Binds the still-unclaimed reports created under `client_generated_id`
    /// to `identity_id`. Already claimed reports are left alone.
    #[instrument(skip(self))]
    pub(crate) async fn claim(
        &self,
        client_generated_id: &str,
        identity_id: Uuid,
    ) -> Result<u64, Error> {
        if client_generated_id.trim().is_empty() {
            return Err(Error::Validation("client_generated_id is required".into()));
        }

        let claimed = self
            .reports
            .claim_anonymous(client_generated_id, identity_id)
            .await
            .map_err(Error::store("claim reports"))?;

        tracing::info!(claimed, "Claimed anonymous reports");

        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCatalogStore;

    fn controller() -> (ReportController, Arc<MemoryCatalogStore>) {
        let store = Arc::new(MemoryCatalogStore::default());

        (ReportController::new(store.clone()), store)
    }

    fn new_report(client_generated_id: &str, report_id: Option<&str>, price: i64) -> NewReport {
        NewReport {
            client_generated_id: client_generated_id.into(),
            report_id: report_id.map(Into::into),
            description: "soil analysis".into(),
            price: Decimal::new(price, 0),
        }
    }

    #[tokio::test]
    async fn created_report_starts_unclaimed_and_unpurchased() {
        let (reports, store) = controller();

        let report = reports
            .create(new_report("client-1", Some("r-1"), 10))
            .await
            .unwrap();

        let stored = store.get("r-1").unwrap();
        assert_eq!(stored, report);
        assert_eq!(stored.identity_id, None);
        assert!(!stored.purchased);
    }

    #[tokio::test]
    async fn report_id_is_generated_when_absent() {
        let (reports, _) = controller();

        let report = reports
            .create(new_report("client-1", None, 10))
            .await
            .unwrap();

        assert!(Uuid::parse_str(&report.report_id).is_ok());
    }

    #[tokio::test]
    async fn rejects_negative_price_and_missing_client_id() {
        let (reports, store) = controller();

        assert!(matches!(
            reports.create(new_report("client-1", None, -1)).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            reports.create(new_report(" ", None, 1)).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn duplicate_report_id_already_exists() {
        let (reports, _) = controller();
        reports
            .create(new_report("client-1", Some("r-1"), 10))
            .await
            .unwrap();

        assert!(matches!(
            reports.create(new_report("client-2", Some("r-1"), 5)).await,
            Err(Error::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn claim_is_one_way() {
        let (reports, _) = controller();
        let alice = Uuid::new_v4();
        let mallory = Uuid::new_v4();
        reports
            .create(new_report("client-1", Some("r-1"), 10))
            .await
            .unwrap();
        reports
            .create(new_report("client-1", Some("r-2"), 20))
            .await
            .unwrap();
        reports
            .create(new_report("client-2", Some("r-3"), 30))
            .await
            .unwrap();

        assert_eq!(reports.claim("client-1", alice).await.unwrap(), 2);
        assert_eq!(reports.claim("client-1", mallory).await.unwrap(), 0);

        let owned = reports.list_for_identity(alice).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|report| report.identity_id == Some(alice)));
        assert!(reports.list_for_identity(mallory).await.unwrap().is_empty());
    }
}
