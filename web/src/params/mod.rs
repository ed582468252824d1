pub(crate) mod bank;
pub(crate) mod oauth;
