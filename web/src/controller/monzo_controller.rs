//! Controller for Monzo's own API.
//!
//! There is a single Monzo credential, so `providerKey` is optional here and, when
//! given, must name Monzo.

use crate::controller::Results;
use crate::params::bank::{
    provider, AuthUrlResponse, ExchangeParams, ProviderKeyParams, TokenPayload,
    TransactionParams,
};
use crate::{AppState, Error, WebErrorKind};

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::account::Account;
use domain::authentication_status::AuthenticationStatus;
use domain::provider::Provider;
use domain::transaction::TransactionList;
use domain::GatewayKind;
use log::*;

const GATEWAY: GatewayKind = GatewayKind::Monzo;

fn monzo(provider_key: Option<&str>) -> Result<Provider, Error> {
    match provider(provider_key)? {
        None | Some(Provider::Monzo) => Ok(Provider::Monzo),
        Some(other) => {
            warn!("Rejected providerKey {other} on a Monzo endpoint");
            Err(Error::Web(WebErrorKind::Input))
        }
    }
}

/// GET a Monzo authorization URL
#[utoipa::path(
    get,
    path = "/api/monzo/get_auth_url",
    responses(
        (status = 200, description = "Authorization URL carrying a fresh state", body = AuthUrlResponse),
        (status = 500, description = "Monzo client is not configured"),
    )
)]
pub async fn get_auth_url(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let auth_url = app_state
        .connections
        .authorize_url(GATEWAY, Provider::Monzo)?;
    Ok(Json(AuthUrlResponse { auth_url }))
}

/// GET exchange a Monzo authorization code for tokens
#[utoipa::path(
    get,
    path = "/api/monzo/exchange_auth_code",
    params(ExchangeParams),
    responses(
        (status = 200, description = "Tokens were issued and stored", body = TokenPayload),
        (status = 400, description = "Unknown state"),
        (status = 502, description = "Monzo rejected the code"),
    )
)]
pub async fn exchange_auth_code(
    State(app_state): State<AppState>,
    Query(params): Query<ExchangeParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = monzo(params.provider.as_deref())?;

    let tokens = app_state
        .connections
        .exchange_code(
            GATEWAY,
            &params.auth_code,
            params.state.as_deref(),
            Some(provider),
        )
        .await?;

    Ok(Json(TokenPayload::from(tokens)))
}

/// GET force a Monzo refresh-token grant
#[utoipa::path(
    get,
    path = "/api/monzo/refresh_access_token",
    params(ProviderKeyParams),
    responses(
        (status = 200, description = "Tokens were refreshed and stored", body = TokenPayload),
        (status = 401, description = "No refresh token, or Monzo refused it"),
    )
)]
pub async fn refresh_access_token(
    State(app_state): State<AppState>,
    Query(params): Query<ProviderKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = monzo(params.provider_key.as_deref())?;

    let tokens = app_state.connections.refresh(GATEWAY, provider).await?;
    Ok(Json(TokenPayload::from(tokens)))
}

/// GET identity behind the Monzo token
#[utoipa::path(
    get,
    path = "/api/monzo/connection_metadata",
    params(ProviderKeyParams),
    responses(
        (status = 200, description = "`results` holding one status", body = [AuthenticationStatus]),
        (status = 401, description = "Monzo is not connected"),
    )
)]
pub async fn connection_metadata(
    State(app_state): State<AppState>,
    Query(params): Query<ProviderKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = monzo(params.provider_key.as_deref())?;

    let status = app_state
        .connections
        .connection_metadata(GATEWAY, provider)
        .await?;

    Ok(Json(Results::one(status)))
}

/// GET Monzo accounts
#[utoipa::path(
    get,
    path = "/api/monzo/get_accounts",
    params(ProviderKeyParams),
    responses(
        (status = 200, description = "`results` holding the accounts", body = [Account]),
        (status = 401, description = "Monzo is not connected"),
        (status = 502, description = "Monzo failed"),
        (status = 504, description = "Monzo timed out"),
    )
)]
pub async fn get_accounts(
    State(app_state): State<AppState>,
    Query(params): Query<ProviderKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = monzo(params.provider_key.as_deref())?;

    let accounts = app_state.connections.accounts(GATEWAY, provider).await?;
    Ok(Json(Results::new(accounts)))
}

/// GET transactions of one Monzo account, with their balance
#[utoipa::path(
    get,
    path = "/api/monzo/get_transactions",
    params(TransactionParams),
    responses(
        (status = 200, description = "Transactions and balance", body = TransactionList),
        (status = 400, description = "Bad date range"),
        (status = 401, description = "Monzo is not connected"),
    )
)]
pub async fn get_transactions(
    State(app_state): State<AppState>,
    Query(params): Query<TransactionParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = monzo(params.provider_key.as_deref())?;
    let range = app_state
        .connections
        .transaction_range(params.from.as_deref(), params.to.as_deref())?;

    let transactions = app_state
        .connections
        .transactions(GATEWAY, provider, &params.account_id, range)
        .await?;

    Ok(Json(transactions))
}
