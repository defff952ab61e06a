use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::store::{CatalogStore, StoreError};
use crate::types::report::{Report, ReportDocument};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone, Debug)]
pub(crate) struct MongoCatalogStore {
    db: Database,
}

impl MongoCatalogStore {
    pub(crate) async fn connect(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }, None).await?;
        tracing::info!(database = %database, "Connected to MongoDB");

        Ok(Self { db })
    }

    pub(crate) async fn initialize_indexes(&self) -> Result<(), mongodb::error::Error> {
        let reports = self.reports();

        let report_id_index = IndexModel::builder()
            .keys(doc! { "report_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("report_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let owner_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_id_lookup".to_string())
                    .build(),
            )
            .build();

        let client_id_index = IndexModel::builder()
            .keys(doc! { "client_generated_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("client_generated_id_lookup".to_string())
                    .build(),
            )
            .build();

        reports
            .create_indexes([report_id_index, owner_index, client_id_index], None)
            .await?;
        tracing::info!("Created indexes on reports collection");

        Ok(())
    }

    fn reports(&self) -> Collection<ReportDocument> {
        self.db.collection("reports")
    }
}

#[async_trait]
impl CatalogStore for MongoCatalogStore {
    #[instrument(skip_all, fields(report_id = %report.report_id))]
    async fn create(&self, report: &Report) -> Result<(), StoreError> {
        match self
            .reports()
            .insert_one(ReportDocument::from(report), None)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate),
            Err(e) => Err(StoreError::Mongo(e)),
        }
    }

    #[instrument(skip(self))]
    async fn list_by_identity(&self, identity_id: Uuid) -> Result<Vec<Report>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1 })
            .build();

        let documents: Vec<ReportDocument> = self
            .reports()
            .find(doc! { "user_id": identity_id.to_string() }, options)
            .await?
            .try_collect()
            .await?;

        documents.into_iter().map(Report::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn claim_anonymous(
        &self,
        client_generated_id: &str,
        identity_id: Uuid,
    ) -> Result<u64, StoreError> {
        // `user_id: null` also matches documents without the field, so only
        // unclaimed reports are touched.
        let result = self
            .reports()
            .update_many(
                doc! { "client_generated_id": client_generated_id, "user_id": null },
                doc! { "$set": { "user_id": identity_id.to_string() } },
                None,
            )
            .await?;

        Ok(result.modified_count)
    }

    #[instrument(skip(self))]
    async fn lookup_owner_and_price(
        &self,
        report_id: &str,
    ) -> Result<Option<(Option<Uuid>, Decimal)>, StoreError> {
        let Some(document) = self
            .reports()
            .find_one(doc! { "report_id": report_id }, None)
            .await?
        else {
            return Ok(None);
        };

        let report = Report::try_from(document)?;

        Ok(Some((report.identity_id, report.price)))
    }

    #[instrument(skip(self))]
    async fn mark_purchased(&self, report_id: &str) -> Result<u64, StoreError> {
        let result = self
            .reports()
            .update_one(
                doc! { "report_id": report_id, "is_purchased": false },
                doc! { "$set": { "is_purchased": true } },
                None,
            )
            .await?;

        Ok(result.matched_count)
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}
