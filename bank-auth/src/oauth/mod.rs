//! OAuth 2.0 authentication infrastructure.
//!
//! Provides the authorization-code and refresh-token flows for open-banking gateways.

mod gateway;
mod state;

pub mod providers;
pub mod token;

pub use gateway::{AuthorizationRequest, Gateway, GatewayKind};
pub use state::{PendingAuthorization, PendingAuthorizations};
