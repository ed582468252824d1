//! Bank connections for the dashboard: provider registry, normalized account and
//! transaction shapes, gateway data clients, token persistence and the flows that
//! tie them to `bank-auth`.
//!
//! `web` only talks to this crate; `bank-auth` types it needs are re-exported here.

pub use bank_auth::oauth::token::{AuthState, MemoryStorage, Storage, TokenResponse};
pub use bank_auth::oauth::GatewayKind;

pub mod account;
pub mod authentication_status;
pub mod connection;
pub mod error;
pub mod provider;
pub mod token_storage;
pub mod transaction;

pub mod gateway;
