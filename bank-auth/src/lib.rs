//! # bank-auth
//!
//! Authentication for the open-banking gateways the dashboard talks to:
//! - OAuth 2.0 infrastructure (tokens, storage, refresh, CSRF state)
//! - OAuth gateway implementations (TrueLayer, Monzo)
//! - HTTP client building with middleware and bearer authentication
//!
//! ## Architecture
//!
//! This crate provides the authentication foundation that `domain` builds upon: the
//! domain layer owns the bank data clients and hands them a token via
//! [`oauth::token::Manager::call_with_refresh`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bank_auth::{
//!     oauth::{Gateway, providers::truelayer, token::{Manager, MemoryStorage}},
//!     http::AuthenticatedClientBuilder,
//! };
//! ```

pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
