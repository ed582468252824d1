//! OAuth gateway trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::token::{RefreshResult, Tokens};
use crate::error::Error;

/// OAuth authorization servers this crate knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    /// Open-banking aggregator fronting several banks.
    TrueLayer,
    /// Monzo's own API.
    Monzo,
}

impl GatewayKind {
    /// Get the gateway identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::TrueLayer => "truelayer",
            GatewayKind::Monzo => "monzo",
        }
    }
}

/// Authorization request with URL and state management data.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to send the user to.
    pub url: String,
    /// CSRF state parameter for validation.
    pub state: String,
}

/// Trait for OAuth 2.0 gateways.
///
/// Implementations handle gateway-specific OAuth flows:
/// - Authorization URL generation
/// - Authorization code exchange for tokens
/// - Token refresh (including rotating refresh tokens)
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Get the gateway kind.
    fn kind(&self) -> GatewayKind;

    /// Generate the authorization URL the user visits to grant access.
    ///
    /// # Arguments
    ///
    /// * `state` - CSRF state parameter for validation
    /// * `provider_network_id` - Bank selector for aggregators (e.g. `uk-ob-amex`);
    ///   ignored by single-bank gateways
    ///
    /// # Errors
    ///
    /// `ErrorKind::Config` when client id or redirect URI are missing.
    fn authorization_url(
        &self,
        state: &str,
        provider_network_id: Option<&str>,
    ) -> Result<AuthorizationRequest, Error>;

    /// Exchange a single-use authorization code for access and refresh tokens.
    ///
    /// Never retried: a second attempt with the same code is rejected by the gateway.
    async fn exchange_code(&self, code: &str) -> Result<Tokens, Error>;

    /// Refresh an access token using a refresh token.
    ///
    /// # Returns
    ///
    /// Refresh result with new tokens and indication if the refresh token rotated.
    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResult, Error>;
}
