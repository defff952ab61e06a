pub(crate) mod purchase;
pub(crate) mod report;
pub(crate) mod token;
pub(crate) mod user;
