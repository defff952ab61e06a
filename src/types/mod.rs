pub(crate) mod report;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod user;
