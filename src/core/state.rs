use std::sync::Arc;

use crate::controllers::purchase::PurchaseController;
use crate::controllers::report::ReportController;
use crate::controllers::token::TokenController;
use crate::controllers::user::UserController;
use crate::core::error::ConfigError;
use crate::store::{CatalogStore, IdentityStore};
use crate::utils::password::PasswordHasher;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) tokens: TokenController,
    pub(crate) user_controller: UserController,
    pub(crate) report_controller: ReportController,
    pub(crate) purchase_controller: PurchaseController,
}

impl AppState {
    pub(crate) fn new(
        identities: Arc<dyn IdentityStore>,
        reports: Arc<dyn CatalogStore>,
        secret: &str,
        hasher: PasswordHasher,
    ) -> Result<Self, ConfigError> {
        let tokens = TokenController::new(secret);

        Ok(AppState {
            user_controller: UserController::new(identities.clone(), tokens.clone(), hasher)?,
            report_controller: ReportController::new(reports.clone()),
            purchase_controller: PurchaseController::new(identities, reports),
            tokens,
        })
    }
}
