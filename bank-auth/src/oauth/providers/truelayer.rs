//! TrueLayer OAuth gateway implementation.

use async_trait::async_trait;

use super::{Credentials, TokenEndpoint};
use crate::error::Error;
use crate::http::HttpClientConfig;
use crate::oauth::token::{RefreshResult, Tokens};
use crate::oauth::{AuthorizationRequest, GatewayKind};

/// Data API permissions requested from every bank, in this order.
pub const SCOPES: [&str; 8] = [
    "info",
    "accounts",
    "balance",
    "cards",
    "transactions",
    "direct_debits",
    "standing_orders",
    "offline_access",
];

/// Appended to the bank selector so TrueLayer also offers its OAuth-only connectors.
const OAUTH_ALL_PROVIDERS: &str = "uk-oauth-all";

/// TrueLayer OAuth gateway.
///
/// Handles OAuth 2.0 flows against the TrueLayer auth server:
/// - Authorization URL generation with a per-bank provider selector
/// - Authorization code exchange
/// - Token refresh
pub struct Gateway {
    credentials: Credentials,
    auth_url: String,
    token_endpoint: TokenEndpoint,
}

impl Gateway {
    /// Create a new TrueLayer gateway.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Client id, secret and redirect URI registered with TrueLayer
    /// * `auth_url` - Base URL of the auth server (e.g. `https://auth.truelayer.com`)
    /// * `http_config` - Timeout and user agent for token endpoint calls
    pub fn new(
        credentials: Credentials,
        auth_url: &str,
        http_config: HttpClientConfig,
    ) -> Result<Self, Error> {
        let auth_url = auth_url.trim_end_matches('/').to_string();
        let token_endpoint =
            TokenEndpoint::new(format!("{}/connect/token", auth_url), http_config)?;

        Ok(Self {
            credentials,
            auth_url,
            token_endpoint,
        })
    }
}

#[async_trait]
impl crate::oauth::Gateway for Gateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::TrueLayer
    }

    fn authorization_url(
        &self,
        state: &str,
        provider_network_id: Option<&str>,
    ) -> Result<AuthorizationRequest, Error> {
        let client_id = self.credentials.client_id()?;
        let redirect_uri = self.credentials.redirect_uri()?;

        let scopes = SCOPES.join("%20");
        let providers = match provider_network_id {
            Some(network_id) => format!(
                "{}%20{}",
                urlencoding::encode(network_id),
                OAUTH_ALL_PROVIDERS
            ),
            None => OAUTH_ALL_PROVIDERS.to_string(),
        };

        let url = format!(
            "{}/?\
            response_type=code&\
            client_id={}&\
            scope={}&\
            redirect_uri={}&\
            providers={}&\
            state={}",
            self.auth_url,
            urlencoding::encode(client_id),
            scopes,
            urlencoding::encode(redirect_uri),
            providers,
            urlencoding::encode(state)
        );

        Ok(AuthorizationRequest {
            url,
            state: state.to_string(),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<Tokens, Error> {
        self.token_endpoint
            .authorization_code(&self.credentials, code)
            .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResult, Error> {
        self.token_endpoint
            .refresh(&self.credentials, refresh_token)
            .await
    }
}
