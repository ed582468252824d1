//! Bank connections: the OAuth flows and authenticated data calls for every provider.
//!
//! `Connections` ties together the two OAuth gateways, their data clients, the token
//! manager and the CSRF state store. Every data call goes through
//! `Manager::call_with_refresh`, so an expired or rejected access token is refreshed
//! once and the call retried once.

use std::sync::Arc;

use bank_auth::http::HttpClientConfig;
use bank_auth::oauth::providers::{monzo, truelayer, Credentials};
use bank_auth::oauth::token::{AuthState, Manager, Storage, TokenResponse};
use bank_auth::oauth::{Gateway, GatewayKind, PendingAuthorizations};
use chrono::Utc;
use log::*;
use service::config::{Config, GatewaySettings};

use crate::account::Account;
use crate::authentication_status::AuthenticationStatus;
use crate::error::{Error, InputErrorKind};
use crate::gateway::monzo::MonzoClient;
use crate::gateway::truelayer::TrueLayerClient;
use crate::gateway::DateRange;
use crate::provider::Provider;
use crate::transaction::TransactionList;

fn credentials(settings: &GatewaySettings) -> Credentials {
    Credentials::new(
        settings.client_id.clone(),
        settings.client_secret.clone(),
        settings.redirect_url.clone(),
    )
}

pub struct Connections {
    truelayer: truelayer::Gateway,
    monzo: monzo::Gateway,
    truelayer_api: TrueLayerClient,
    monzo_api: MonzoClient,
    manager: Manager<Arc<dyn Storage>>,
    states: PendingAuthorizations,
    transaction_history_days: u32,
}

impl Connections {
    /// Builds gateways and data clients from config.
    ///
    /// Missing client credentials do not fail here; the flows that need them report a
    /// `Config` error instead.
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, Error> {
        let http_config = HttpClientConfig {
            timeout: config.http_timeout(),
            max_retries: config.http_max_retries,
            ..Default::default()
        };

        let truelayer_settings = config.truelayer();
        let monzo_settings = config.monzo();

        Ok(Self {
            truelayer: truelayer::Gateway::new(
                credentials(&truelayer_settings),
                &truelayer_settings.auth_url,
                http_config.clone(),
            )?,
            monzo: monzo::Gateway::new(
                credentials(&monzo_settings),
                &monzo_settings.auth_url,
                &monzo_settings.api_url,
                http_config.clone(),
            )?,
            truelayer_api: TrueLayerClient::new(&truelayer_settings.api_url, http_config.clone())?,
            monzo_api: MonzoClient::new(&monzo_settings.api_url, http_config)?,
            manager: Manager::new(storage),
            states: PendingAuthorizations::new(),
            transaction_history_days: config.transaction_history_days,
        })
    }

    fn gateway(&self, kind: GatewayKind) -> &dyn Gateway {
        match kind {
            GatewayKind::TrueLayer => &self.truelayer,
            GatewayKind::Monzo => &self.monzo,
        }
    }

    /// Authorization URL for `provider`, carrying a fresh single-use state.
    pub fn authorize_url(&self, kind: GatewayKind, provider: Provider) -> Result<String, Error> {
        let state = self.states.issue(kind, provider.id());

        match self
            .gateway(kind)
            .authorization_url(&state, Some(provider.network_id()))
        {
            Ok(request) => {
                info!(
                    "Built {} authorization URL for {}",
                    kind.as_str(),
                    provider.display_name()
                );
                Ok(request.url)
            }
            Err(e) => {
                self.states.take(&state);
                Err(e.into())
            }
        }
    }

    /// Gateway an OAuth callback belongs to, judged by its state. Unknown or missing
    /// states are assumed to be TrueLayer's.
    pub fn callback_gateway(&self, state: Option<&str>) -> GatewayKind {
        state
            .and_then(|state| self.states.gateway_of(state))
            .unwrap_or(GatewayKind::TrueLayer)
    }

    /// Works out which provider a code belongs to.
    ///
    /// A state wins over an explicit provider and is consumed. The Monzo gateway only
    /// ever serves Monzo.
    fn resolve_provider(
        &self,
        kind: GatewayKind,
        state: Option<&str>,
        provider: Option<Provider>,
    ) -> Result<Provider, Error> {
        if let Some(state) = state {
            let pending = self
                .states
                .take(state)
                .filter(|pending| pending.gateway == kind)
                .ok_or_else(|| {
                    warn!("Rejected unknown or expired OAuth state for {}", kind.as_str());
                    Error::input(InputErrorKind::InvalidState, "Unknown or expired OAuth state")
                })?;
            return Provider::parse(&pending.provider_id);
        }

        match (kind, provider) {
            (GatewayKind::Monzo, _) => Ok(Provider::Monzo),
            (GatewayKind::TrueLayer, Some(provider)) => Ok(provider),
            (GatewayKind::TrueLayer, None) => Err(Error::input(
                InputErrorKind::MissingParameter,
                "Either state or provider is required",
            )),
        }
    }

    /// Exchanges an authorization code and stores the tokens under the provider's
    /// credential key.
    pub async fn exchange_code(
        &self,
        kind: GatewayKind,
        code: &str,
        state: Option<&str>,
        provider: Option<Provider>,
    ) -> Result<TokenResponse, Error> {
        if code.is_empty() {
            return Err(Error::input(
                InputErrorKind::MissingParameter,
                "authCode must not be empty",
            ));
        }

        let provider = self.resolve_provider(kind, state, provider)?;
        let key = provider.credential_key(kind);

        let tokens = self
            .manager
            .exchange_code(self.gateway(kind), key, code)
            .await?;

        info!("Connected {} via {}", provider.display_name(), kind.as_str());
        Ok(tokens.to_response())
    }

    /// Runs the refresh-token grant for a provider unconditionally.
    pub async fn refresh(
        &self,
        kind: GatewayKind,
        provider: Provider,
    ) -> Result<TokenResponse, Error> {
        let key = provider.credential_key(kind);
        let tokens = self.manager.refresh(self.gateway(kind), key).await?;
        Ok(tokens.to_response())
    }

    pub async fn auth_state(
        &self,
        kind: GatewayKind,
        provider: Provider,
    ) -> Result<AuthState, Error> {
        Ok(self.manager.state(provider.credential_key(kind)).await?)
    }

    pub async fn connection_metadata(
        &self,
        kind: GatewayKind,
        provider: Provider,
    ) -> Result<AuthenticationStatus, Error> {
        let key = provider.credential_key(kind);

        let status = match kind {
            GatewayKind::TrueLayer => {
                self.manager
                    .call_with_refresh(&self.truelayer, key, |token| {
                        self.truelayer_api.connection_metadata(token, provider)
                    })
                    .await?
            }
            GatewayKind::Monzo => {
                self.manager
                    .call_with_refresh(&self.monzo, key, |token| self.monzo_api.who_am_i(token))
                    .await?
            }
        };

        Ok(status)
    }

    /// Accounts (Monzo) or cards (TrueLayer) visible to the provider's grant.
    pub async fn accounts(
        &self,
        kind: GatewayKind,
        provider: Provider,
    ) -> Result<Vec<Account>, Error> {
        let key = provider.credential_key(kind);

        let accounts = match kind {
            GatewayKind::TrueLayer => {
                self.manager
                    .call_with_refresh(&self.truelayer, key, |token| {
                        self.truelayer_api.cards(token)
                    })
                    .await?
            }
            GatewayKind::Monzo => {
                self.manager
                    .call_with_refresh(&self.monzo, key, |token| self.monzo_api.accounts(token))
                    .await?
            }
        };

        Ok(accounts)
    }

    /// Default range for transaction queries: the configured history window ending today.
    pub fn transaction_range(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<DateRange, Error> {
        DateRange::from_params(
            from,
            to,
            self.transaction_history_days,
            Utc::now().date_naive(),
        )
    }

    pub async fn transactions(
        &self,
        kind: GatewayKind,
        provider: Provider,
        account_id: &str,
        range: DateRange,
    ) -> Result<TransactionList, Error> {
        if account_id.is_empty() {
            return Err(Error::input(
                InputErrorKind::MissingParameter,
                "accountID must not be empty",
            ));
        }
        if account_id == "." || account_id == ".." {
            return Err(Error::input(
                InputErrorKind::InvalidAccount,
                "accountID must not be a dot segment",
            ));
        }

        let key = provider.credential_key(kind);

        let transactions = match kind {
            GatewayKind::TrueLayer => {
                self.manager
                    .call_with_refresh(&self.truelayer, key, |token| {
                        self.truelayer_api.card_transactions(token, account_id, range)
                    })
                    .await?
            }
            GatewayKind::Monzo => {
                self.manager
                    .call_with_refresh(&self.monzo, key, |token| {
                        self.monzo_api.transactions(token, account_id, range)
                    })
                    .await?
            }
        };

        Ok(TransactionList::new(transactions))
    }
}
