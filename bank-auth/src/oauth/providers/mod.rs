//! Gateway implementations and the token endpoint they share.

pub mod monzo;
pub mod truelayer;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{config_error, Error};
use crate::http::{
    json_or_error, send_logged, AuthenticatedClient, AuthenticatedClientBuilder, HttpClientConfig,
};
use crate::oauth::token::{RefreshResult, TokenResponse, Tokens};

/// OAuth client registration for one gateway.
///
/// Every field is optional so a partially configured server can still start; the missing
/// value is reported as `ErrorKind::Config` when a flow needs it.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub redirect_uri: Option<String>,
}

impl Credentials {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_uri: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.filter(|s| !s.is_empty()),
            client_secret: client_secret
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            redirect_uri: redirect_uri.filter(|s| !s.is_empty()),
        }
    }

    pub fn client_id(&self) -> Result<&str, Error> {
        self.client_id
            .as_deref()
            .ok_or_else(|| config_error("OAuth client id is not configured"))
    }

    pub fn client_secret(&self) -> Result<&str, Error> {
        self.client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .ok_or_else(|| config_error("OAuth client secret is not configured"))
    }

    pub fn redirect_uri(&self) -> Result<&str, Error> {
        self.redirect_uri
            .as_deref()
            .ok_or_else(|| config_error("OAuth redirect URI is not configured"))
    }
}

/// Request to exchange authorization code for tokens
#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
}

/// Request to refresh access token
#[derive(Serialize)]
struct TokenRefreshRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
}

/// A gateway's token endpoint, shared by the authorization-code and refresh-token grants.
pub(crate) struct TokenEndpoint {
    url: String,
    client: AuthenticatedClient,
}

impl TokenEndpoint {
    /// Token POSTs are never retried, whatever the configured retry budget is.
    pub(crate) fn new(url: String, http_config: HttpClientConfig) -> Result<Self, Error> {
        let client = AuthenticatedClientBuilder::from_config(http_config)
            .with_max_retries(0)
            .build()?;
        Ok(Self { url, client })
    }

    pub(crate) async fn authorization_code(
        &self,
        credentials: &Credentials,
        code: &str,
    ) -> Result<Tokens, Error> {
        let request = TokenExchangeRequest {
            grant_type: "authorization_code",
            client_id: credentials.client_id()?,
            client_secret: credentials.client_secret()?,
            redirect_uri: credentials.redirect_uri()?,
            code,
        };

        debug!("Exchanging authorization code at {}", self.url);

        let builder = self.client.post(&self.url).form(&request);
        let response = send_logged("POST", &self.url, builder).await?;
        let body: TokenResponse = json_or_error("POST", &self.url, response).await?;

        info!("Exchanged authorization code for tokens at {}", self.url);
        Ok(Tokens::from_response(body, Utc::now()))
    }

    pub(crate) async fn refresh(
        &self,
        credentials: &Credentials,
        refresh_token: &str,
    ) -> Result<RefreshResult, Error> {
        let request = TokenRefreshRequest {
            grant_type: "refresh_token",
            client_id: credentials.client_id()?,
            client_secret: credentials.client_secret()?,
            refresh_token,
        };

        debug!("Refreshing access token at {}", self.url);

        let builder = self.client.post(&self.url).form(&request);
        let response = send_logged("POST", &self.url, builder).await?;
        let body: TokenResponse = json_or_error("POST", &self.url, response).await?;

        info!("Refreshed access token at {}", self.url);
        Ok(RefreshResult::from_response(body, refresh_token, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_blank_credentials_are_treated_as_missing() {
        let credentials = Credentials::new(
            Some(String::new()),
            None,
            Some("https://localhost/cb".to_string()),
        );

        assert_eq!(credentials.client_id().unwrap_err().error_kind, ErrorKind::Config);
        assert_eq!(credentials.client_secret().unwrap_err().error_kind, ErrorKind::Config);
        assert_eq!(credentials.redirect_uri().unwrap(), "https://localhost/cb");
    }

    #[test]
    fn test_secret_is_not_in_debug_output() {
        let credentials = Credentials::new(
            Some("client".to_string()),
            Some("super-secret".to_string()),
            None,
        );
        assert!(!format!("{:?}", credentials).contains("super-secret"));
    }
}
