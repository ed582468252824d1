//! Controller for the TrueLayer aggregator endpoints.
//!
//! Every bank reached through TrueLayer has its own credential; the `provider` /
//! `providerKey` parameter selects which one a request uses.

use crate::controller::Results;
use crate::params::bank::{
    provider, required_provider, AuthUrlParams, AuthUrlResponse, ExchangeParams,
    ProviderKeyParams, TokenPayload, TransactionParams,
};
use crate::{AppState, Error};

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use domain::account::Account;
use domain::authentication_status::AuthenticationStatus;
use domain::transaction::TransactionList;
use domain::GatewayKind;
use log::*;

const GATEWAY: GatewayKind = GatewayKind::TrueLayer;

/// GET a TrueLayer authorization URL for one bank
#[utoipa::path(
    get,
    path = "/api/truelayer/get_auth_url",
    params(AuthUrlParams),
    responses(
        (status = 200, description = "Authorization URL carrying a fresh state", body = AuthUrlResponse),
        (status = 400, description = "Missing or unknown provider"),
        (status = 500, description = "TrueLayer client is not configured"),
    )
)]
pub async fn get_auth_url(
    State(app_state): State<AppState>,
    Query(params): Query<AuthUrlParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = required_provider(params.provider.as_deref())?;
    debug!("GET TrueLayer authorization URL for {provider}");

    let auth_url = app_state.connections.authorize_url(GATEWAY, provider)?;
    Ok(Json(AuthUrlResponse { auth_url }))
}

/// GET exchange an authorization code for tokens
#[utoipa::path(
    get,
    path = "/api/truelayer/exchange_auth_code",
    params(ExchangeParams),
    responses(
        (status = 200, description = "Tokens were issued and stored", body = TokenPayload),
        (status = 400, description = "Unknown state or provider"),
        (status = 502, description = "TrueLayer rejected the code"),
    )
)]
pub async fn exchange_auth_code(
    State(app_state): State<AppState>,
    Query(params): Query<ExchangeParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = provider(params.provider.as_deref())?;

    let tokens = app_state
        .connections
        .exchange_code(GATEWAY, &params.auth_code, params.state.as_deref(), provider)
        .await?;

    Ok(Json(TokenPayload::from(tokens)))
}

/// GET force a refresh-token grant for one bank
#[utoipa::path(
    get,
    path = "/api/truelayer/refresh_access_token",
    params(ProviderKeyParams),
    responses(
        (status = 200, description = "Tokens were refreshed and stored", body = TokenPayload),
        (status = 401, description = "No refresh token, or TrueLayer refused it"),
    )
)]
pub async fn refresh_access_token(
    State(app_state): State<AppState>,
    Query(params): Query<ProviderKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = required_provider(params.provider_key.as_deref())?;

    let tokens = app_state.connections.refresh(GATEWAY, provider).await?;
    Ok(Json(TokenPayload::from(tokens)))
}

/// GET consent status of a bank connection
#[utoipa::path(
    get,
    path = "/api/truelayer/connection_metadata",
    params(ProviderKeyParams),
    responses(
        (status = 200, description = "`results` holding one status", body = [AuthenticationStatus]),
        (status = 401, description = "The bank is not connected"),
    )
)]
pub async fn connection_metadata(
    State(app_state): State<AppState>,
    Query(params): Query<ProviderKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = required_provider(params.provider_key.as_deref())?;

    let status = app_state
        .connections
        .connection_metadata(GATEWAY, provider)
        .await?;

    Ok(Json(Results::one(status)))
}

/// GET cards of a connected bank
#[utoipa::path(
    get,
    path = "/api/truelayer/get_cards",
    params(ProviderKeyParams),
    responses(
        (status = 200, description = "`results` holding the cards", body = [Account]),
        (status = 401, description = "The bank is not connected"),
        (status = 502, description = "TrueLayer failed"),
        (status = 504, description = "TrueLayer timed out"),
    )
)]
pub async fn get_cards(
    State(app_state): State<AppState>,
    Query(params): Query<ProviderKeyParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = required_provider(params.provider_key.as_deref())?;

    let cards = app_state.connections.accounts(GATEWAY, provider).await?;
    debug!("Found {} cards for {provider}", cards.len());

    Ok(Json(Results::new(cards)))
}

/// GET transactions of one card, with their balance
#[utoipa::path(
    get,
    path = "/api/truelayer/get_transactions",
    params(TransactionParams),
    responses(
        (status = 200, description = "Transactions and balance", body = TransactionList),
        (status = 400, description = "Bad date range or provider"),
        (status = 401, description = "The bank is not connected"),
    )
)]
pub async fn get_transactions(
    State(app_state): State<AppState>,
    Query(params): Query<TransactionParams>,
) -> Result<impl IntoResponse, Error> {
    let provider = required_provider(params.provider_key.as_deref())?;
    let range = app_state
        .connections
        .transaction_range(params.from.as_deref(), params.to.as_deref())?;

    let transactions = app_state
        .connections
        .transactions(GATEWAY, provider, &params.account_id, range)
        .await?;

    Ok(Json(transactions))
}
