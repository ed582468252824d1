//! Where token records live between requests and restarts.

use async_trait::async_trait;

use super::Tokens;
use crate::error::Error;

/// One token record per credential key (`AMEX`, `MONZO_DIRECT`, ...).
///
/// `update_atomic` is a compare-and-swap on the refresh token, and all three methods may
/// be called concurrently for the same key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Replaces whatever is stored under `key`.
    async fn store(&self, key: &str, tokens: Tokens) -> Result<(), Error>;

    async fn get(&self, key: &str) -> Result<Option<Tokens>, Error>;

    /// Writes `new_tokens` only while the stored refresh token equals `old_refresh`;
    /// otherwise fails with `TokenErrorKind::Stale`.
    async fn update_atomic(
        &self,
        key: &str,
        old_refresh: Option<&str>,
        new_tokens: Tokens,
    ) -> Result<(), Error>;
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for std::sync::Arc<T> {
    async fn store(&self, key: &str, tokens: Tokens) -> Result<(), Error> {
        (**self).store(key, tokens).await
    }

    async fn get(&self, key: &str) -> Result<Option<Tokens>, Error> {
        (**self).get(key).await
    }

    async fn update_atomic(
        &self,
        key: &str,
        old_refresh: Option<&str>,
        new_tokens: Tokens,
    ) -> Result<(), Error> {
        (**self).update_atomic(key, old_refresh, new_tokens).await
    }
}
