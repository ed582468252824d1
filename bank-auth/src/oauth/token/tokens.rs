//! OAuth token types.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Raw token endpoint payload, shared by the authorization-code and refresh-token grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// OAuth tokens with metadata.
#[derive(Debug, Clone)]
pub struct Tokens {
    /// Access token for API requests.
    pub access_token: SecretString,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: Option<SecretString>,
    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// User or client the gateway associated with this grant.
    pub user_id: Option<String>,
}

impl Tokens {
    /// Build tokens from a token endpoint payload received at `received_at`.
    ///
    /// An `expires_in` that does not fit a timestamp leaves the expiry unknown.
    pub fn from_response(response: TokenResponse, received_at: DateTime<Utc>) -> Self {
        Self {
            access_token: SecretString::from(response.access_token),
            refresh_token: response.refresh_token.map(SecretString::from),
            expires_at: response
                .expires_in
                .and_then(Duration::try_seconds)
                .and_then(|lifetime| received_at.checked_add_signed(lifetime)),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scopes: response
                .scope
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            user_id: response.user_id,
        }
    }

    /// Render the tokens back into the token endpoint shape.
    ///
    /// `expires_in` is recomputed relative to now.
    pub fn to_response(&self) -> TokenResponse {
        TokenResponse {
            access_token: self.access_token.expose_secret().to_string(),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            expires_in: self
                .time_until_expiry()
                .map(|remaining| remaining.num_seconds().max(0)),
            scope: (!self.scopes.is_empty()).then(|| self.scopes.join(" ")),
            token_type: Some(self.token_type.clone()),
            user_id: self.user_id.clone(),
        }
    }

    /// Check if the access token is expired or about to expire soon.
    ///
    /// Returns true if token is expired or will expire within 5 minutes. Tokens without a
    /// known expiry are treated as valid until a gateway rejects them.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires| {
                let now = Utc::now();
                let buffer = Duration::minutes(5);
                expires <= (now + buffer)
            })
            .unwrap_or(false)
    }

    /// Get the remaining time until expiration.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at.map(|expires| expires - Utc::now())
    }

    /// True if both records carry the same access token.
    pub fn same_access_token(&self, other: &SecretString) -> bool {
        self.access_token.expose_secret() == other.expose_secret()
    }
}

/// Result of a token refresh operation.
#[derive(Debug, Clone)]
pub struct RefreshResult {
    /// The new tokens.
    pub tokens: Tokens,
    /// True if the gateway issued a new refresh token.
    pub refresh_token_rotated: bool,
}

impl RefreshResult {
    /// Build a refresh result, carrying the previous refresh token forward when the
    /// gateway did not issue a new one.
    pub fn from_response(
        response: TokenResponse,
        previous_refresh_token: &str,
        received_at: DateTime<Utc>,
    ) -> Self {
        let mut tokens = Tokens::from_response(response, received_at);
        let refresh_token_rotated = match &tokens.refresh_token {
            Some(new) => new.expose_secret() != previous_refresh_token,
            None => {
                tokens.refresh_token = Some(SecretString::from(previous_refresh_token.to_string()));
                false
            }
        };

        Self {
            tokens,
            refresh_token_rotated,
        }
    }
}
