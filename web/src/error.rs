use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Domain(DomainError),
    Web(WebErrorKind),
}

/// Errors raised by the web layer itself, before anything reaches `domain`.
#[derive(Debug, PartialEq)]
pub enum WebErrorKind {
    Input,
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Web(WebErrorKind::Input) => (StatusCode::BAD_REQUEST, "BAD REQUEST"),
            Error::Domain(err) => match &err.error_kind {
                DomainErrorKind::Input(_) => (StatusCode::BAD_REQUEST, "BAD REQUEST"),
                DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                    InternalErrorKind::Config => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "SERVER NOT CONFIGURED")
                    }
                    InternalErrorKind::Storage | InternalErrorKind::Other(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                    }
                },
                DomainErrorKind::External(external_error_kind) => match external_error_kind {
                    ExternalErrorKind::Unauthenticated => {
                        (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
                    }
                    ExternalErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY TIMEOUT"),
                    ExternalErrorKind::Network
                    | ExternalErrorKind::Rejected(_)
                    | ExternalErrorKind::InvalidResponse
                    | ExternalErrorKind::Other(_) => (StatusCode::BAD_GATEWAY, "BAD GATEWAY"),
                },
            },
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status();

        if status.is_server_error() {
            error!("Responding {status}: {self}");
        } else {
            debug!("Responding {status}: {self}");
        }

        (status, message).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self::Domain(err.into())
    }
}
