//! TrueLayer Data API client.
//!
//! Covers the three endpoints the dashboard needs: connection metadata, the card list
//! and per-card transactions. Amounts from TrueLayer are already in major units.

use bank_auth::http::HttpClientConfig;
use bank_auth::Error as BankAuthError;
use log::*;
use secrecy::SecretString;
use serde::Deserialize;

use super::{ApiClient, DateRange};
use crate::account::Account;
use crate::authentication_status::AuthenticationStatus;
use crate::provider::Provider;
use crate::transaction::{format_amount, format_created, Transaction};

#[derive(Debug, Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

/// One entry of `GET /data/v1/me`.
#[derive(Debug, Deserialize)]
pub struct RawConnection {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub credentials_id: Option<String>,
    #[serde(default)]
    pub consent_status: Option<String>,
}

/// One entry of `GET /data/v1/cards`.
#[derive(Debug, Deserialize)]
pub struct RawCard {
    pub account_id: String,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub partial_card_number: String,
}

/// One entry of `GET /data/v1/cards/{id}/transactions`.
#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub transaction_category: String,
}

impl RawConnection {
    pub fn normalize(self, provider: Provider) -> AuthenticationStatus {
        AuthenticationStatus {
            authenticated: self.consent_status.as_deref() == Some(provider.consent_status()),
            client_id: self.client_id,
            client_ip: None,
            user_id: self.credentials_id,
        }
    }
}

impl RawCard {
    pub fn normalize(self) -> Account {
        Account {
            id: self.account_id,
            account_number: self.partial_card_number,
            currency: self.currency,
            description: self.display_name,
            account_type: self.card_type,
            ..Default::default()
        }
    }
}

impl RawTransaction {
    /// Ids are assigned later by `TransactionList`.
    pub fn normalize(self, card_id: &str) -> Transaction {
        Transaction {
            id: 0,
            account_id: card_id.to_string(),
            amount_with_prefix: format_amount(self.amount, &self.currency),
            amount: self.amount,
            amount_is_pending: false,
            category: self.transaction_category,
            counterparty_name: self.merchant_name.unwrap_or_default(),
            created: format_created(&self.timestamp),
            currency: self.currency,
            description: self.description,
            notes: String::new(),
        }
    }
}

pub struct TrueLayerClient {
    api: ApiClient,
}

impl TrueLayerClient {
    pub fn new(api_url: &str, http_config: HttpClientConfig) -> Result<Self, BankAuthError> {
        Ok(Self {
            api: ApiClient::new(api_url, http_config)?,
        })
    }

    /// Consent status of the connection the token belongs to.
    ///
    /// A connection listing no entries is reported as not authenticated.
    pub async fn connection_metadata(
        &self,
        token: SecretString,
        provider: Provider,
    ) -> Result<AuthenticationStatus, BankAuthError> {
        let body: Results<RawConnection> = self.api.get(token, "/data/v1/me", &[]).await?;

        Ok(body
            .results
            .into_iter()
            .next()
            .map(|connection| connection.normalize(provider))
            .unwrap_or_default())
    }

    pub async fn cards(&self, token: SecretString) -> Result<Vec<Account>, BankAuthError> {
        let body: Results<RawCard> = self.api.get(token, "/data/v1/cards", &[]).await?;
        debug!("TrueLayer returned {} cards", body.results.len());

        Ok(body.results.into_iter().map(RawCard::normalize).collect())
    }

    pub async fn card_transactions(
        &self,
        token: SecretString,
        card_id: &str,
        range: DateRange,
    ) -> Result<Vec<Transaction>, BankAuthError> {
        let path = format!("/data/v1/cards/{}/transactions", urlencoding::encode(card_id));
        let from = range.from.format("%Y-%m-%d").to_string();
        let to = range.to.format("%Y-%m-%d").to_string();

        let body: Results<RawTransaction> = self
            .api
            .get(token, &path, &[("from", from.as_str()), ("to", to.as_str())])
            .await?;

        Ok(body
            .results
            .into_iter()
            .map(|raw| raw.normalize(card_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_auth::ErrorKind;
    use chrono::NaiveDate;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> TrueLayerClient {
        let http_config = HttpClientConfig {
            max_retries: 0,
            ..Default::default()
        };
        TrueLayerClient::new(&server.url(), http_config).unwrap()
    }

    fn token() -> SecretString {
        SecretString::from("test_access".to_string())
    }

    #[tokio::test]
    async fn test_connection_metadata_compares_consent_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/v1/me")
            .match_header("authorization", "Bearer test_access")
            .with_status(200)
            .with_body(
                r#"{"results":[{"client_id":"client-123","credentials_id":"cred-1","consent_status":"AUTHORISED"}],"status":"Succeeded"}"#,
            )
            .create_async()
            .await;

        let status = client(&server)
            .connection_metadata(token(), Provider::Amex)
            .await
            .unwrap();
        assert!(status.authenticated);
        assert_eq!(status.client_id.as_deref(), Some("client-123"));
        assert_eq!(status.user_id.as_deref(), Some("cred-1"));

        // HSBC reports a different spelling, so the same payload is not a match.
        let status = client(&server)
            .connection_metadata(token(), Provider::Hsbc)
            .await
            .unwrap();
        assert!(!status.authenticated);
    }

    #[tokio::test]
    async fn test_cards_are_normalized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/v1/cards")
            .with_status(200)
            .with_body(
                r#"{"results":[{
                    "account_id":"card-1",
                    "card_network":"AMEX",
                    "card_type":"CREDIT",
                    "currency":"GBP",
                    "display_name":"Gold Card",
                    "partial_card_number":"1001"
                }]}"#,
            )
            .create_async()
            .await;

        let cards = client(&server).cards(token()).await.unwrap();
        assert_eq!(
            cards,
            vec![Account {
                id: "card-1".to_string(),
                account_number: "1001".to_string(),
                currency: "GBP".to_string(),
                description: "Gold Card".to_string(),
                account_type: "CREDIT".to_string(),
                ..Default::default()
            }]
        );
    }

    #[tokio::test]
    async fn test_card_transactions_use_range_and_major_units() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/v1/cards/card-1/transactions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".into(), "2021-09-01".into()),
                Matcher::UrlEncoded("to".into(), "2021-09-30".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"results":[{
                    "timestamp":"2021-09-06T14:05:00+00:00",
                    "description":"COFFEE",
                    "transaction_type":"DEBIT",
                    "transaction_category":"PURCHASE",
                    "amount":23.5,
                    "currency":"GBP",
                    "merchant_name":"Cafe"
                }]}"#,
            )
            .create_async()
            .await;

        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
        };
        let transactions = client(&server)
            .card_transactions(token(), "card-1", range)
            .await
            .unwrap();

        assert_eq!(transactions.len(), 1);
        let transaction = &transactions[0];
        assert_eq!(transaction.account_id, "card-1");
        assert_eq!(transaction.amount, 23.5);
        assert_eq!(transaction.amount_with_prefix, "£23.50");
        assert_eq!(transaction.category, "PURCHASE");
        assert_eq!(transaction.counterparty_name, "Cafe");
        assert_eq!(transaction.created, "14:05PM 06/09/2021");
    }

    #[tokio::test]
    async fn test_card_id_stays_inside_its_path_segment() {
        let mut server = Server::new_async().await;
        let me = server
            .mock("GET", "/data/v1/me")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let transactions = server
            .mock("GET", "/data/v1/cards/..%2Fme%3F/transactions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
        };
        let result = client(&server)
            .card_transactions(token(), "../me?", range)
            .await
            .unwrap();

        assert!(result.is_empty());
        transactions.assert_async().await;
        me.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthenticated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/v1/cards")
            .with_status(401)
            .with_body(r#"{"error":"invalid_token"}"#)
            .create_async()
            .await;

        let err = client(&server).cards(token()).await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Unauthenticated);
    }
}
