//! Error types for the `domain` layer.
use bank_auth::error::{
    Error as BankAuthError, ErrorKind as BankAuthErrorKind, OAuthErrorKind, TokenErrorKind,
    TransportErrorKind, UpstreamErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `domain` depends on
/// `bank-auth` and `web` depends on `domain`, but `web` never sees `bank-auth` errors
/// directly; the `error_kind`s are what `web` turns into HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    /// The caller sent something we cannot act on.
    Input(InputErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Missing client credentials, redirect URL or similar.
    Config,
    /// The token store could not be read or written.
    Storage,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Timeout,
    /// The gateway rejected the access token, or there is no usable token.
    Unauthenticated,
    /// The gateway answered with a non-success status.
    Rejected(u16),
    /// The gateway answered with a body we could not parse.
    InvalidResponse,
    Other(String),
}

/// Enum representing bad input from the client.
#[derive(Debug, PartialEq)]
pub enum InputErrorKind {
    UnknownProvider,
    /// The OAuth state is unknown, expired, already used or belongs to the other gateway.
    InvalidState,
    MissingParameter,
    /// An account id that would not name a single path segment.
    InvalidAccount,
    InvalidDate,
}

impl Error {
    pub fn input(kind: InputErrorKind, message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Input(kind),
        }
    }

    pub fn config(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    pub fn storage(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Error {
            source: Some(source.into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Storage),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `bank-auth` layer to the `domain` layer.
impl From<BankAuthError> for Error {
    fn from(err: BankAuthError) -> Self {
        let error_kind = match &err.error_kind {
            BankAuthErrorKind::Transport(TransportErrorKind::Timeout) => {
                DomainErrorKind::External(ExternalErrorKind::Timeout)
            }
            BankAuthErrorKind::Transport(_) => {
                DomainErrorKind::External(ExternalErrorKind::Network)
            }
            BankAuthErrorKind::Upstream(UpstreamErrorKind::Rejected(status)) => {
                DomainErrorKind::External(ExternalErrorKind::Rejected(*status))
            }
            BankAuthErrorKind::Upstream(UpstreamErrorKind::InvalidResponse) => {
                DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
            }
            BankAuthErrorKind::Unauthenticated
            | BankAuthErrorKind::Token(TokenErrorKind::NotFound) => {
                DomainErrorKind::External(ExternalErrorKind::Unauthenticated)
            }
            BankAuthErrorKind::Config => DomainErrorKind::Internal(InternalErrorKind::Config),
            BankAuthErrorKind::Token(TokenErrorKind::Storage) => {
                DomainErrorKind::Internal(InternalErrorKind::Storage)
            }
            BankAuthErrorKind::Token(TokenErrorKind::Stale) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Token record changed during refresh".to_string()),
            ),
            BankAuthErrorKind::OAuth(OAuthErrorKind::InvalidState) => {
                DomainErrorKind::Input(InputErrorKind::InvalidState)
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
