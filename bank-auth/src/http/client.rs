//! Outbound client construction, shared by the token endpoints and the data clients.

use std::time::Duration;

use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::BackoffPolicy;
use crate::error::Error;

/// Connection setup never gets more than this, even with a long request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Whole-request timeout; running out of it is a `Transport(Timeout)` error.
    pub timeout: Duration,
    /// Retries of transient transport failures. Zero disables the retry middleware.
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            user_agent: format!("bank-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub type AuthenticatedClient = reqwest_middleware::ClientWithMiddleware;

/// Builds the rustls client every gateway call goes through.
///
/// Token endpoints build theirs with `with_max_retries(0)`: a code is single-use, so a
/// POST that may already have been delivered is never replayed.
pub struct AuthenticatedClientBuilder {
    config: HttpClientConfig,
}

impl AuthenticatedClientBuilder {
    pub fn new() -> Self {
        Self::from_config(HttpClientConfig::default())
    }

    pub fn from_config(config: HttpClientConfig) -> Self {
        Self { config }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn build(self) -> Result<AuthenticatedClient, Error> {
        let HttpClientConfig {
            timeout,
            max_retries,
            user_agent,
        } = self.config;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .connect_timeout(timeout.min(CONNECT_TIMEOUT))
            .user_agent(user_agent)
            .build()?;

        let builder = ClientBuilder::new(client);
        let client = match max_retries {
            0 => builder.build(),
            n => builder
                .with(RetryTransientMiddleware::new_with_policy(BackoffPolicy::new(n, timeout)))
                .build(),
        };

        Ok(client)
    }
}

impl Default for AuthenticatedClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
