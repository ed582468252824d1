use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters a gateway appends when redirecting back after consent.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user declined
    pub error: Option<String>,
}
