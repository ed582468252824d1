//! Monzo OAuth gateway implementation.

use async_trait::async_trait;

use super::{Credentials, TokenEndpoint};
use crate::error::Error;
use crate::http::HttpClientConfig;
use crate::oauth::token::{RefreshResult, Tokens};
use crate::oauth::{AuthorizationRequest, GatewayKind};

/// Monzo OAuth gateway.
///
/// The consent screen lives on `auth.monzo.com` while the token endpoint is part of the
/// API host, so both base URLs are needed.
pub struct Gateway {
    credentials: Credentials,
    auth_url: String,
    token_endpoint: TokenEndpoint,
}

impl Gateway {
    /// Create a new Monzo gateway.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Client id, secret and redirect URI registered with Monzo
    /// * `auth_url` - Consent screen base URL (e.g. `https://auth.monzo.com`)
    /// * `api_url` - API base URL hosting `/oauth2/token` (e.g. `https://api.monzo.com`)
    /// * `http_config` - Timeout and user agent for token endpoint calls
    pub fn new(
        credentials: Credentials,
        auth_url: &str,
        api_url: &str,
        http_config: HttpClientConfig,
    ) -> Result<Self, Error> {
        let token_url = format!("{}/oauth2/token", api_url.trim_end_matches('/'));

        Ok(Self {
            credentials,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            token_endpoint: TokenEndpoint::new(token_url, http_config)?,
        })
    }
}

#[async_trait]
impl crate::oauth::Gateway for Gateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Monzo
    }

    fn authorization_url(
        &self,
        state: &str,
        _provider_network_id: Option<&str>,
    ) -> Result<AuthorizationRequest, Error> {
        let client_id = self.credentials.client_id()?;
        let redirect_uri = self.credentials.redirect_uri()?;

        let url = format!(
            "{}/?client_id={}&redirect_uri={}&response_type=code&state={}",
            self.auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
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
