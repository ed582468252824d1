//! HTTP client building with middleware.

mod bearer;
mod client;
mod response;
mod retry;

pub use bearer::BearerTokenAuth;
pub use client::{AuthenticatedClient, AuthenticatedClientBuilder, HttpClientConfig};
pub use response::{json_or_error, send_logged};
pub use retry::BackoffPolicy;
