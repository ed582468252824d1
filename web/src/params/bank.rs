//! Query parameters and response bodies for the bank endpoints.

use domain::provider::Provider;
use domain::TokenResponse;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::Error;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthUrlParams {
    /// Provider id ("amex"), key prefix ("AMEX") or network id ("uk-ob-amex")
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeParams {
    /// Authorization code forwarded from the OAuth callback
    pub auth_code: String,
    /// State forwarded from the OAuth callback
    pub state: Option<String>,
    /// Provider the code belongs to, when no state is available
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKeyParams {
    /// Provider key prefix ("AMEX") or provider id ("amex")
    pub provider_key: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    pub provider_key: Option<String>,
    #[serde(rename = "accountID")]
    pub account_id: String,
    /// First day, YYYY-MM-DD
    pub from: Option<String>,
    /// Last day, YYYY-MM-DD
    pub to: Option<String>,
}

/// Parses an optional provider parameter.
pub(crate) fn provider(value: Option<&str>) -> Result<Option<Provider>, Error> {
    Ok(value.map(Provider::parse).transpose()?)
}

/// Parses a provider parameter that must be present.
pub(crate) fn required_provider(value: Option<&str>) -> Result<Provider, Error> {
    provider(value)?.ok_or(Error::Web(crate::WebErrorKind::Input))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthUrlResponse {
    #[serde(rename = "authURL")]
    pub auth_url: String,
}

/// Token endpoint payload as returned to the browser.
///
/// Serializes exactly like `domain::TokenResponse`. It is a separate type because the
/// OpenAPI schema belongs to `web`, and `bank-auth`, which owns `TokenResponse`, does not
/// depend on `utoipa`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPayload {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl From<TokenResponse> for TokenPayload {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            scope: response.scope,
            token_type: response.token_type,
            user_id: response.user_id,
        }
    }
}
