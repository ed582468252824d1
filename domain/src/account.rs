//! Normalized account shape shared by every gateway.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A bank account or card, in the shape the dashboard renders.
///
/// Gateways fill what they expose; everything else stays at its default (empty string
/// or `false`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub account_number: String,
    pub closed: bool,
    pub country_code: String,
    pub created: String,
    pub currency: String,
    pub description: String,
    pub sort_code: String,
    #[serde(rename = "type")]
    pub account_type: String,
}
