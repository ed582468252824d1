//! The banks the dashboard can connect to and every string form they take.

use crate::error::{Error, InputErrorKind};
use bank_auth::oauth::GatewayKind;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Credential key used for tokens issued by Monzo's own API, as opposed to Monzo reached
/// through TrueLayer (which is stored under `MONZO`).
pub const MONZO_DIRECT_KEY: &str = "MONZO_DIRECT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Amex,
    Hsbc,
    Monzo,
    Revolut,
    Starling,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Amex,
        Provider::Hsbc,
        Provider::Monzo,
        Provider::Revolut,
        Provider::Starling,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Provider::Amex => "amex",
            Provider::Hsbc => "hsbc",
            Provider::Monzo => "monzo",
            Provider::Revolut => "revolut",
            Provider::Starling => "starling",
        }
    }

    /// Identifier TrueLayer uses in its `providers` selector.
    pub fn network_id(&self) -> &'static str {
        match self {
            Provider::Amex => "uk-ob-amex",
            Provider::Hsbc => "uk-ob-hsbc",
            Provider::Monzo => "uk-ob-monzo",
            Provider::Revolut => "uk-ob-revolut",
            Provider::Starling => "uk-ob-starling",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Amex => "American Express",
            Provider::Hsbc => "HSBC",
            Provider::Monzo => "Monzo",
            Provider::Revolut => "Revolut",
            Provider::Starling => "Starling",
        }
    }

    /// `consent_status` value TrueLayer reports for an active connection to this bank.
    pub fn consent_status(&self) -> &'static str {
        match self {
            Provider::Hsbc => "Authorised",
            Provider::Amex | Provider::Monzo | Provider::Revolut | Provider::Starling => {
                "AUTHORISED"
            }
        }
    }

    /// Prefix of the env-file lines holding this bank's TrueLayer tokens.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Provider::Amex => "AMEX",
            Provider::Hsbc => "HSBC",
            Provider::Monzo => "MONZO",
            Provider::Revolut => "REVOLUT",
            Provider::Starling => "STARLING",
        }
    }

    /// Credential key a token for this bank is stored under on the given gateway.
    pub fn credential_key(&self, gateway: GatewayKind) -> &'static str {
        match gateway {
            GatewayKind::TrueLayer => self.key_prefix(),
            GatewayKind::Monzo => MONZO_DIRECT_KEY,
        }
    }

    /// Parses a provider id, key prefix or TrueLayer network id, ignoring case.
    pub fn parse(value: &str) -> Result<Provider, Error> {
        let value = value.trim();
        Provider::ALL
            .into_iter()
            .find(|provider| {
                value.eq_ignore_ascii_case(provider.id())
                    || value.eq_ignore_ascii_case(provider.key_prefix())
                    || value.eq_ignore_ascii_case(provider.network_id())
            })
            .ok_or_else(|| {
                Error::input(
                    InputErrorKind::UnknownProvider,
                    &format!("Unknown provider: {value}"),
                )
            })
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::parse(s)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
