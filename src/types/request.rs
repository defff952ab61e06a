use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct RegisterData {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Deserialize)]
pub(crate) struct LoginData {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdatePasswordData {
    pub(crate) new_password: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct NewReport {
    pub(crate) client_generated_id: String,
    pub(crate) report_id: Option<String>,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) price: Decimal,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ClaimReports {
    pub(crate) client_generated_id: String,
}
