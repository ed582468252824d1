//! Connection status as reported by a gateway's identity endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a credential key currently holds a working grant, and who it belongs to.
///
/// Recomputed on every request; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationStatus {
    pub authenticated: bool,
    pub client_id: Option<String>,
    pub client_ip: Option<String>,
    pub user_id: Option<String>,
}
