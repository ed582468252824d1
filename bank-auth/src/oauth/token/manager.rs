//! Token manager with per-key refresh locking and authentication state tracking.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Storage, Tokens};
use crate::error::{unauthenticated_error, Error};
use crate::oauth::Gateway;

/// Authentication state of one credential key.
///
/// ```text
/// Unauthorized -> CodeReceived -> Authenticated -> TokenExpired -> Authenticated
///       ^              |                                 |
///       +--------------+---------------------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No usable token. Only the authorization URL and code exchange are allowed.
    Unauthorized,
    /// A code exchange is in flight.
    CodeReceived,
    /// API calls are permitted.
    Authenticated,
    /// The access token was rejected or ran out; a refresh is pending.
    TokenExpired,
}

/// Token manager that coordinates token retrieval and refresh with per-key locking.
///
/// The per-key locking prevents duplicate refreshes when several concurrent requests for
/// the same credential key see an expired token. The first request refreshes; the others
/// wait on the lock, notice the stored access token has changed and reuse it.
pub struct Manager<S: Storage> {
    storage: S,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    states: DashMap<String, AuthState>,
}

impl<S: Storage> Manager<S> {
    /// Create a new token manager with the given storage backend.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            refresh_locks: DashMap::new(),
            states: DashMap::new(),
        }
    }

    /// Current authentication state for a credential key.
    ///
    /// Keys with no recorded transition (for example tokens loaded from storage at
    /// startup) are `Authenticated` when a record exists and `Unauthorized` otherwise.
    pub async fn state(&self, key: &str) -> Result<AuthState, Error> {
        if let Some(state) = self.states.get(key) {
            return Ok(*state);
        }

        Ok(match self.storage.get(key).await? {
            Some(_) => AuthState::Authenticated,
            None => AuthState::Unauthorized,
        })
    }

    fn transition(&self, key: &str, to: AuthState) {
        let from = self.states.insert(key.to_string(), to);
        if from != Some(to) {
            debug!("Auth state for {}: {:?} -> {:?}", key, from, to);
        }
    }

    /// Exchange an authorization code and persist the resulting tokens.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The OAuth gateway that issued the code
    /// * `key` - Credential key to store the tokens under
    /// * `code` - Single-use authorization code from the OAuth callback
    pub async fn exchange_code<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        key: &str,
        code: &str,
    ) -> Result<Tokens, Error> {
        self.transition(key, AuthState::CodeReceived);

        let tokens = match gateway.exchange_code(code).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Code exchange for {} failed: {}", key, e);
                self.transition(key, AuthState::Unauthorized);
                return Err(e);
            }
        };

        if let Err(e) = self.storage.store(key, tokens.clone()).await {
            self.transition(key, AuthState::Unauthorized);
            return Err(e);
        }

        self.transition(key, AuthState::Authenticated);
        info!("Stored new tokens for {}", key);
        Ok(tokens)
    }

    /// Get a valid access token for a credential key, refreshing first if it is known to
    /// be expired.
    pub async fn get_valid_token<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        key: &str,
    ) -> Result<SecretString, Error> {
        if self.state(key).await? == AuthState::Unauthorized {
            return Err(unauthenticated_error("Credential key is not authorized"));
        }

        let tokens = self
            .storage
            .get(key)
            .await?
            .ok_or_else(|| unauthenticated_error("No tokens stored for credential key"))?;

        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        debug!("Access token for {} is expired, refreshing", key);
        let tokens = self.refresh_after(gateway, key, Some(&tokens.access_token)).await?;
        Ok(tokens.access_token)
    }

    /// Refresh the tokens for a credential key unconditionally.
    pub async fn refresh<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        key: &str,
    ) -> Result<Tokens, Error> {
        self.refresh_after(gateway, key, None).await
    }

    /// Run `call` with a valid access token, refreshing and retrying exactly once if the
    /// gateway rejects the token.
    ///
    /// A second consecutive `Unauthenticated` is returned to the caller as is.
    pub async fn call_with_refresh<G, T, F, Fut>(
        &self,
        gateway: &G,
        key: &str,
        call: F,
    ) -> Result<T, Error>
    where
        G: Gateway + ?Sized,
        F: Fn(SecretString) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let token = self.get_valid_token(gateway, key).await?;

        match call(token.clone()).await {
            Err(e) if e.is_unauthenticated() => {
                debug!("Access token for {} was rejected, refreshing once", key);
                let tokens = self.refresh_after(gateway, key, Some(&token)).await?;

                let result = call(tokens.access_token).await;
                if let Err(e) = &result {
                    if e.is_unauthenticated() {
                        warn!("Freshly refreshed token for {} was rejected as well", key);
                    }
                }
                result
            }
            other => other,
        }
    }

    /// Refresh inside the per-key critical section.
    ///
    /// When `rejected` is set and the stored access token no longer matches it, another
    /// caller has already refreshed and the stored tokens are returned without contacting
    /// the gateway.
    async fn refresh_after<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        key: &str,
        rejected: Option<&SecretString>,
    ) -> Result<Tokens, Error> {
        self.transition(key, AuthState::TokenExpired);

        // Get or create a lock for this key
        let lock = self
            .refresh_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        let Some(tokens) = self.storage.get(key).await? else {
            self.transition(key, AuthState::Unauthorized);
            return Err(unauthenticated_error("Tokens disappeared during refresh"));
        };

        if let Some(rejected) = rejected {
            if !tokens.same_access_token(rejected) && !tokens.is_expired() {
                debug!("Token for {} was refreshed by another request", key);
                self.transition(key, AuthState::Authenticated);
                return Ok(tokens);
            }
        }

        let Some(refresh_token) = tokens.refresh_token.as_ref() else {
            self.transition(key, AuthState::Unauthorized);
            return Err(unauthenticated_error("No refresh token available"));
        };
        let refresh_token = refresh_token.expose_secret();

        let refresh_result = match gateway.refresh_token(refresh_token).await {
            Ok(result) => result,
            Err(e) if e.is_retryable() => {
                // The refresh token may still be good; stay in TokenExpired so the next
                // call tries again.
                warn!("Token refresh for {} did not complete: {}", key, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Token refresh for {} was refused: {}", key, e);
                self.transition(key, AuthState::Unauthorized);
                return Err(e);
            }
        };

        if refresh_result.refresh_token_rotated {
            debug!("Gateway rotated the refresh token for {}", key);
        }

        self.storage
            .update_atomic(key, Some(refresh_token), refresh_result.tokens.clone())
            .await?;

        self.transition(key, AuthState::Authenticated);
        info!("Token refreshed successfully for {}", key);

        Ok(refresh_result.tokens)
    }

    /// Store tokens for a credential key.
    pub async fn store_tokens(&self, key: &str, tokens: Tokens) -> Result<(), Error> {
        self.storage.store(key, tokens).await?;
        self.transition(key, AuthState::Authenticated);
        Ok(())
    }

    /// Get stored tokens for a credential key (may be expired).
    pub async fn get_tokens(&self, key: &str) -> Result<Option<Tokens>, Error> {
        self.storage.get(key).await
    }
}
