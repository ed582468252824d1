//! Controller for the OAuth redirect target registered with both gateways.
//!
//! The code is not exchanged here. The browser is sent on to the frontend, which calls
//! the matching `exchange_auth_code` endpoint.

use crate::params::oauth::CallbackParams;
use crate::{AppState, Error, WebErrorKind};

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use domain::GatewayKind;
use log::*;

/// GET /oauth/callback
///
/// Forwards the gateway's redirect to `<frontend>/truelayer_callback` or
/// `<frontend>/monzo_callback`, depending on which gateway issued the state.
#[utoipa::path(
    get,
    path = "/oauth/callback",
    params(CallbackParams),
    responses(
        (status = 307, description = "Redirect to the frontend callback page"),
        (status = 400, description = "Neither code nor error was given"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, Error> {
    let gateway = app_state
        .connections
        .callback_gateway(params.state.as_deref());

    let mut query = match (&params.code, &params.error) {
        (Some(code), _) => format!("code={}", urlencoding::encode(code)),
        (None, Some(error)) => {
            warn!("{} authorization failed: {error}", gateway.as_str());
            format!("error={}", urlencoding::encode(error))
        }
        (None, None) => return Err(Error::Web(WebErrorKind::Input)),
    };
    if let Some(state) = &params.state {
        query.push_str(&format!("&state={}", urlencoding::encode(state)));
    }

    let page = match gateway {
        GatewayKind::TrueLayer => "truelayer_callback",
        GatewayKind::Monzo => "monzo_callback",
    };

    let redirect_url = format!("{}/{}?{}", app_state.config.frontend_base_url(), page, query);
    debug!("Forwarding OAuth callback to {page}");

    Ok(Redirect::temporary(&redirect_url))
}
