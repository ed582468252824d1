//! Error types for the `bank-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for bank-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in bank-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The request never produced a response (network failure, timeout).
    Transport(TransportErrorKind),
    /// The gateway answered, but not with something we can use.
    Upstream(UpstreamErrorKind),
    /// The access token was rejected, or no usable token exists for the key.
    Unauthenticated,
    /// Client credentials or gateway URLs are missing.
    Config,
    Token(TokenErrorKind),
    OAuth(OAuthErrorKind),
}

/// Errors from the HTTP transport layer.
#[derive(Debug, PartialEq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// Errors reported by a gateway that did respond.
#[derive(Debug, PartialEq)]
pub enum UpstreamErrorKind {
    /// Non-success status other than 401.
    Rejected(u16),
    InvalidResponse,
}

/// Errors from token management operations.
#[derive(Debug, PartialEq)]
pub enum TokenErrorKind {
    NotFound,
    Storage,
    /// Compare-and-swap failed because the stored refresh token changed underneath us.
    Stale,
}

/// Errors from OAuth flow bookkeeping.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    InvalidState,
}

impl Error {
    /// Transport failures are the only errors a caller may retry blindly.
    pub fn is_retryable(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Transport(_))
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.error_kind == ErrorKind::Unauthenticated
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Transport(kind) => write!(f, "Transport error: {:?}", kind),
            ErrorKind::Upstream(kind) => write!(f, "Upstream error: {:?}", kind),
            ErrorKind::Unauthenticated => write!(f, "Unauthenticated"),
            ErrorKind::Config => write!(f, "Configuration error"),
            ErrorKind::Token(kind) => write!(f, "Token error: {:?}", kind),
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_timeout() {
            ErrorKind::Transport(TransportErrorKind::Timeout)
        } else if err.is_connect() {
            ErrorKind::Transport(TransportErrorKind::Connect)
        } else if err.is_decode() {
            ErrorKind::Upstream(UpstreamErrorKind::InvalidResponse)
        } else if err.is_builder() {
            ErrorKind::Config
        } else {
            ErrorKind::Transport(TransportErrorKind::Other)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => Error {
                source: Some(err.into()),
                error_kind: ErrorKind::Transport(TransportErrorKind::Other),
            },
        }
    }
}

/// Helper function to create configuration errors.
pub fn config_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Config,
    }
}

/// Helper function to create unauthenticated errors.
pub fn unauthenticated_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Unauthenticated,
    }
}

/// Helper function to create upstream errors.
pub fn upstream_error(kind: UpstreamErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Upstream(kind),
    }
}

/// Helper function to create token errors.
pub fn token_error(kind: TokenErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Token(kind),
    }
}

/// Helper function to create storage errors.
pub fn storage_error(message: &str) -> Error {
    token_error(TokenErrorKind::Storage, message)
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}
