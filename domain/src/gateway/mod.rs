//! Bank data clients for the two gateways, plus what they share.
//!
//! Clients return `bank_auth::Error` so the token manager can tell a rejected token
//! apart from every other failure; `connection` converts to domain errors.

pub mod monzo;
pub mod truelayer;

use bank_auth::http::{
    json_or_error, send_logged, AuthenticatedClient, AuthenticatedClientBuilder, BearerTokenAuth,
    HttpClientConfig,
};
use bank_auth::Error as BankAuthError;
use chrono::{Duration, NaiveDate};
use secrecy::SecretString;
use serde::de::DeserializeOwned;

use crate::error::{Error, InputErrorKind};

/// Inclusive day range for a transaction query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// The last `days` days up to and including `today`.
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        Self {
            from: today - Duration::days(i64::from(days)),
            to: today,
        }
    }

    /// Builds a range from optional `YYYY-MM-DD` bounds, filling gaps from the default
    /// history window ending `today`.
    pub fn from_params(
        from: Option<&str>,
        to: Option<&str>,
        history_days: u32,
        today: NaiveDate,
    ) -> Result<Self, Error> {
        let to = match to {
            Some(to) => parse_date(to)?,
            None => today,
        };
        let from = match from {
            Some(from) => parse_date(from)?,
            None => to - Duration::days(i64::from(history_days)),
        };

        if from > to {
            return Err(Error::input(
                InputErrorKind::InvalidDate,
                "from must not be after to",
            ));
        }

        Ok(Self { from, to })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: crate::error::DomainErrorKind::Input(InputErrorKind::InvalidDate),
    })
}

/// Bearer-authenticated JSON GETs against one API base URL.
pub(crate) struct ApiClient {
    client: AuthenticatedClient,
    base_url: String,
}

impl ApiClient {
    pub(crate) fn new(
        base_url: &str,
        http_config: HttpClientConfig,
    ) -> Result<Self, BankAuthError> {
        Ok(Self {
            client: AuthenticatedClientBuilder::from_config(http_config).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        token: SecretString,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BankAuthError> {
        let url = format!("{}{}", self.base_url, path);
        let auth = BearerTokenAuth::new(token);
        let request = auth.authenticate(self.client.get(&url).query(query));

        let response = send_logged("GET", &url, request).await?;
        json_or_error("GET", &url, response).await
    }
}
