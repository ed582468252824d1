//! In-process token storage.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::sync::Mutex;

use super::{Storage, Tokens};
use crate::error::{token_error, Error, TokenErrorKind};

/// Token storage backed by a `HashMap`. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    tokens: Mutex<HashMap<String, Tokens>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn store(&self, key: &str, tokens: Tokens) -> Result<(), Error> {
        let mut map = self.tokens.lock().await;
        map.insert(key.to_string(), tokens);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Tokens>, Error> {
        let map = self.tokens.lock().await;
        Ok(map.get(key).cloned())
    }

    async fn update_atomic(
        &self,
        key: &str,
        old_refresh: Option<&str>,
        new_tokens: Tokens,
    ) -> Result<(), Error> {
        let mut map = self.tokens.lock().await;
        let current = map
            .get(key)
            .and_then(|t| t.refresh_token.as_ref())
            .map(|t| t.expose_secret().as_str());

        if current != old_refresh {
            return Err(token_error(
                TokenErrorKind::Stale,
                "Refresh token changed since it was read",
            ));
        }

        map.insert(key.to_string(), new_tokens);
        Ok(())
    }
}
