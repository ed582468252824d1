//! CSRF state values handed out with authorization URLs.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;

use super::GatewayKind;

/// What an outstanding state value was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAuthorization {
    pub gateway: GatewayKind,
    /// Provider the user picked; the callback has no other way to know it.
    pub provider_id: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Outstanding authorizations keyed by their state value.
///
/// A state is 32 random bytes, hex encoded, and can be taken exactly once before its
/// TTL runs out. Issuing a new state sweeps the expired ones.
pub struct PendingAuthorizations {
    pending: DashMap<String, PendingAuthorization>,
    ttl: Duration,
}

impl PendingAuthorizations {
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
        }
    }

    pub fn issue(&self, gateway: GatewayKind, provider_id: &str) -> String {
        let now = Utc::now();
        self.pending.retain(|_, pending| pending.is_live(now));

        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        let state = hex::encode(random_bytes);

        self.pending.insert(
            state.clone(),
            PendingAuthorization {
                gateway,
                provider_id: provider_id.to_string(),
                expires_at: now + self.ttl,
            },
        );
        state
    }

    /// Removes `state` and returns what it was issued for, unless it is unknown, already
    /// taken or expired.
    pub fn take(&self, state: &str) -> Option<PendingAuthorization> {
        self.pending
            .remove(state)
            .map(|(_, pending)| pending)
            .filter(|pending| pending.is_live(Utc::now()))
    }

    /// Gateway a live state was issued for, leaving it in place.
    pub fn gateway_of(&self, state: &str) -> Option<GatewayKind> {
        self.pending
            .get(state)
            .filter(|pending| pending.is_live(Utc::now()))
            .map(|pending| pending.gateway)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for PendingAuthorizations {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_hex_of_32_bytes() {
        let pending = PendingAuthorizations::new();
        let state = pending.issue(GatewayKind::TrueLayer, "amex");

        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, pending.issue(GatewayKind::TrueLayer, "amex"));
    }

    #[test]
    fn test_take_returns_binding_once() {
        let pending = PendingAuthorizations::new();
        let state = pending.issue(GatewayKind::TrueLayer, "hsbc");

        let taken = pending.take(&state).unwrap();
        assert_eq!(taken.gateway, GatewayKind::TrueLayer);
        assert_eq!(taken.provider_id, "hsbc");

        assert!(pending.take(&state).is_none());
        assert!(pending.gateway_of(&state).is_none());
    }

    #[test]
    fn test_gateway_of_does_not_consume() {
        let pending = PendingAuthorizations::new();
        let state = pending.issue(GatewayKind::Monzo, "monzo");

        assert_eq!(pending.gateway_of(&state), Some(GatewayKind::Monzo));
        assert_eq!(pending.gateway_of(&state), Some(GatewayKind::Monzo));
        assert!(pending.take(&state).is_some());
    }

    #[test]
    fn test_unknown_state() {
        let pending = PendingAuthorizations::new();
        assert!(pending.take("not-a-state").is_none());
        assert!(pending.gateway_of("not-a-state").is_none());
    }

    #[test]
    fn test_expired_state_is_refused_and_swept() {
        let pending = PendingAuthorizations::with_ttl(Duration::seconds(-1));
        let state = pending.issue(GatewayKind::TrueLayer, "amex");

        assert!(pending.gateway_of(&state).is_none());
        pending.issue(GatewayKind::TrueLayer, "amex");
        assert_eq!(pending.len(), 1);
        assert!(pending.take(&state).is_none());
    }
}
