pub(crate) mod auth;
pub(crate) mod report;
pub(crate) mod router;
pub(crate) mod user;
