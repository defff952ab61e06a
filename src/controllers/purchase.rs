//! Purchase of a report across the ledger (identity balances) and the
//! catalog (report documents).
//!
//! The two stores share no transaction, so a purchase is a short saga:
//!
//! ```text
//! Lookup -> Guard -> Credit -> Commit -> Done
//!                                 \
//!                                  -> Compensate -> PurchaseConflict | CompensationFailed
//! ```
//!
//! The compare-and-set in `Commit` is the only guard against two purchases of
//! the same report. The credit runs first and is not keyed, so two racing
//! purchases can both credit the owner before one of them loses the
//! compare-and-set and debits its credit back.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::core::error::Error;
use crate::store::{CatalogStore, IdentityStore, StoreError};
use crate::types::response::PurchaseReceipt;

#[derive(Debug, thiserror::Error)]
enum CommitFailure {
    #[error("report was already purchased or no longer exists")]
    Conflict,
    #[error("marking the report purchased failed: {0}")]
    Store(StoreError),
}

#[derive(Debug)]
enum Step {
    Lookup,
    Guard {
        owner: Option<Uuid>,
        price: Decimal,
    },
    Credit {
        identity_id: Uuid,
        price: Decimal,
    },
    Commit {
        identity_id: Uuid,
        price: Decimal,
    },
    Compensate {
        identity_id: Uuid,
        price: Decimal,
        cause: CommitFailure,
    },
    Done(PurchaseReceipt),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Lookup => "lookup",
            Step::Guard { .. } => "guard",
            Step::Credit { .. } => "credit",
            Step::Commit { .. } => "commit",
            Step::Compensate { .. } => "compensate",
            Step::Done(_) => "done",
        }
    }
}

#[derive(Clone)]
pub(crate) struct PurchaseController {
    identities: Arc<dyn IdentityStore>,
    reports: Arc<dyn CatalogStore>,
}

impl PurchaseController {
    pub(crate) fn new(identities: Arc<dyn IdentityStore>, reports: Arc<dyn CatalogStore>) -> Self {
        Self {
            identities,
            reports,
        }
    }

    /// Marks `report_id` purchased and credits its price to the report's
    /// owner.
    #[instrument(skip(self))]
    pub(crate) async fn purchase(&self, report_id: &str) -> Result<PurchaseReceipt, Error> {
        let mut step = Step::Lookup;

        loop {
            tracing::debug!(step = step.name());

            step = match step {
                Step::Lookup => match self.reports.lookup_owner_and_price(report_id).await {
                    Ok(Some((owner, price))) => Step::Guard { owner, price },
                    Ok(None) => return Err(Error::NotFound),
                    Err(e) => return Err(Error::store("lookup report")(e)),
                },

                Step::Guard {
                    owner: Some(identity_id),
                    price,
                } => Step::Credit { identity_id, price },
                Step::Guard { owner: None, .. } => return Err(Error::InvalidReport),

                Step::Credit { identity_id, price } => {
                    self.identities
                        .adjust_balance(identity_id, price)
                        .await
                        .map_err(Error::CreditFailed)?;

                    Step::Commit { identity_id, price }
                }

                Step::Commit { identity_id, price } => {
                    match self.reports.mark_purchased(report_id).await {
                        Ok(0) => Step::Compensate {
                            identity_id,
                            price,
                            cause: CommitFailure::Conflict,
                        },
                        Ok(_) => Step::Done(PurchaseReceipt {
                            report_id: report_id.to_owned(),
                            identity_id,
                            price,
                        }),
                        Err(e) => Step::Compensate {
                            identity_id,
                            price,
                            cause: CommitFailure::Store(e),
                        },
                    }
                }

                Step::Compensate {
                    identity_id,
                    price,
                    cause,
                } => {
                    return Err(self
                        .compensate(report_id, identity_id, price, cause)
                        .await);
                }

                Step::Done(receipt) => {
                    tracing::info!(identity_id = %receipt.identity_id, price = %receipt.price, "Report purchased");
                    return Ok(receipt);
                }
            };
        }
    }

    /// Reverses the credit of a purchase whose commit did not go through.
    async fn compensate(
        &self,
        report_id: &str,
        identity_id: Uuid,
        price: Decimal,
        cause: CommitFailure,
    ) -> Error {
        match self.identities.adjust_balance(identity_id, -price).await {
            Ok(()) => {
                tracing::warn!(%identity_id, %price, "Purchase rolled back: {}", cause);

                match cause {
                    CommitFailure::Conflict => Error::PurchaseConflict {
                        report_id: report_id.to_owned(),
                    },
                    CommitFailure::Store(source) => Error::Store {
                        operation: "commit purchase",
                        source,
                    },
                }
            }
            Err(rollback) => {
                tracing::error!(
                    %identity_id,
                    %price,
                    reconciliation_required = true,
                    "Purchase could not be rolled back: {}; rollback error: {}",
                    cause,
                    rollback
                );

                Error::CompensationFailed {
                    report_id: report_id.to_owned(),
                    identity_id,
                    amount: price,
                    conflict: cause.to_string(),
                    rollback,
                }
            }
        }
    }
}
