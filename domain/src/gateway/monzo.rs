//! Monzo API client.
//!
//! Monzo reports amounts in minor units; they are converted to major units here.

use bank_auth::http::HttpClientConfig;
use bank_auth::Error as BankAuthError;
use log::*;
use secrecy::SecretString;
use serde::Deserialize;

use super::{ApiClient, DateRange};
use crate::account::Account;
use crate::authentication_status::AuthenticationStatus;
use crate::transaction::{format_amount, format_created, from_minor_units, Transaction};

/// `GET /ping/whoami`
#[derive(Debug, Deserialize)]
pub struct RawWhoAmI {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<RawAccount>,
}

#[derive(Debug, Deserialize)]
pub struct RawAccount {
    pub id: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_code: String,
    #[serde(default, rename = "type")]
    pub account_type: String,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<RawTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct RawCounterparty {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub account_id: String,
    /// Minor units.
    pub amount: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub counterparty: Option<RawCounterparty>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: String,
    /// Either a merchant id or, when expanded, a merchant object.
    #[serde(default)]
    pub merchant: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: String,
    /// Settlement timestamp; empty while the transaction is pending.
    #[serde(default)]
    pub settled: Option<String>,
}

impl From<RawWhoAmI> for AuthenticationStatus {
    fn from(raw: RawWhoAmI) -> Self {
        AuthenticationStatus {
            authenticated: raw.authenticated,
            client_id: raw.client_id,
            client_ip: None,
            user_id: raw.user_id,
        }
    }
}

impl RawAccount {
    pub fn normalize(self) -> Account {
        Account {
            id: self.id,
            account_number: self.account_number,
            closed: self.closed,
            country_code: self.country_code,
            created: self.created,
            currency: self.currency,
            description: self.description,
            sort_code: self.sort_code,
            account_type: self.account_type,
        }
    }
}

impl RawTransaction {
    fn counterparty_name(&self) -> String {
        self.counterparty
            .as_ref()
            .and_then(|c| c.name.clone())
            .or_else(|| {
                self.merchant
                    .as_ref()
                    .and_then(|m| m.get("name"))
                    .and_then(|name| name.as_str())
                    .map(String::from)
            })
            .unwrap_or_default()
    }

    /// Ids are assigned later by `TransactionList`.
    pub fn normalize(self) -> Transaction {
        let amount = from_minor_units(self.amount);
        let counterparty_name = self.counterparty_name();

        Transaction {
            id: 0,
            account_id: self.account_id,
            amount,
            amount_with_prefix: format_amount(amount, &self.currency),
            amount_is_pending: self.settled.as_deref().map_or(true, str::is_empty),
            category: self.category,
            counterparty_name,
            created: format_created(&self.created),
            currency: self.currency,
            description: self.description,
            notes: self.notes,
        }
    }
}

pub struct MonzoClient {
    api: ApiClient,
}

impl MonzoClient {
    pub fn new(api_url: &str, http_config: HttpClientConfig) -> Result<Self, BankAuthError> {
        Ok(Self {
            api: ApiClient::new(api_url, http_config)?,
        })
    }

    pub async fn who_am_i(
        &self,
        token: SecretString,
    ) -> Result<AuthenticationStatus, BankAuthError> {
        let body: RawWhoAmI = self.api.get(token, "/ping/whoami", &[]).await?;
        Ok(body.into())
    }

    pub async fn accounts(&self, token: SecretString) -> Result<Vec<Account>, BankAuthError> {
        let body: AccountsResponse = self.api.get(token, "/accounts", &[]).await?;
        debug!("Monzo returned {} accounts", body.accounts.len());

        Ok(body.accounts.into_iter().map(RawAccount::normalize).collect())
    }

    /// Transactions created on any day of `range`, with merchants expanded so a
    /// transaction without a counterparty can still be named.
    pub async fn transactions(
        &self,
        token: SecretString,
        account_id: &str,
        range: DateRange,
    ) -> Result<Vec<Transaction>, BankAuthError> {
        let since = format!("{}T00:00:00Z", range.from.format("%Y-%m-%d"));
        let before = match range.to.succ_opt() {
            Some(next_day) => format!("{}T00:00:00Z", next_day.format("%Y-%m-%d")),
            None => format!("{}T23:59:59Z", range.to.format("%Y-%m-%d")),
        };

        let body: TransactionsResponse = self
            .api
            .get(
                token,
                "/transactions",
                &[
                    ("account_id", account_id),
                    ("since", since.as_str()),
                    ("before", before.as_str()),
                    ("expand[]", "merchant"),
                ],
            )
            .await?;

        Ok(body
            .transactions
            .into_iter()
            .map(RawTransaction::normalize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> MonzoClient {
        let http_config = HttpClientConfig {
            max_retries: 0,
            ..Default::default()
        };
        MonzoClient::new(&server.url(), http_config).unwrap()
    }

    fn token() -> SecretString {
        SecretString::from("monzo_access".to_string())
    }

    #[tokio::test]
    async fn test_who_am_i() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/ping/whoami")
            .match_header("authorization", "Bearer monzo_access")
            .with_status(200)
            .with_body(r#"{"authenticated":true,"client_id":"oauth2client_1","user_id":"user_1"}"#)
            .create_async()
            .await;

        let status = client(&server).who_am_i(token()).await.unwrap();
        assert_eq!(
            status,
            AuthenticationStatus {
                authenticated: true,
                client_id: Some("oauth2client_1".to_string()),
                client_ip: None,
                user_id: Some("user_1".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_accounts_keep_every_populated_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/accounts")
            .with_status(200)
            .with_body(
                r#"{"accounts":[
                    {
                        "id":"acc_00009237aqC8c5umZmrRdh",
                        "closed":false,
                        "created":"2015-11-13T12:17:42.102Z",
                        "description":"Peter Pan's Account",
                        "type":"uk_retail",
                        "currency":"GBP",
                        "country_code":"GB",
                        "account_number":"12345678",
                        "sort_code":"040004",
                        "owners":[{"user_id":"user_1"}]
                    },
                    {"id":"acc_prepaid","closed":true}
                ]}"#,
            )
            .create_async()
            .await;

        let accounts = client(&server).accounts(token()).await.unwrap();
        assert_eq!(
            accounts[0],
            Account {
                id: "acc_00009237aqC8c5umZmrRdh".to_string(),
                account_number: "12345678".to_string(),
                closed: false,
                country_code: "GB".to_string(),
                created: "2015-11-13T12:17:42.102Z".to_string(),
                currency: "GBP".to_string(),
                description: "Peter Pan's Account".to_string(),
                sort_code: "040004".to_string(),
                account_type: "uk_retail".to_string(),
            }
        );
        assert_eq!(
            accounts[1],
            Account {
                id: "acc_prepaid".to_string(),
                closed: true,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_transactions_convert_minor_units() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/transactions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("account_id".into(), "acc_1".into()),
                Matcher::UrlEncoded("since".into(), "2024-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("before".into(), "2024-02-01T00:00:00Z".into()),
                Matcher::UrlEncoded("expand[]".into(), "merchant".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"transactions":[
                    {
                        "id":"tx_1",
                        "account_id":"acc_1",
                        "amount":-150,
                        "created":"2024-01-15T08:30:00Z",
                        "currency":"GBP",
                        "description":"PRET",
                        "category":"eating_out",
                        "notes":"breakfast",
                        "settled":"2024-01-16T02:00:00Z",
                        "merchant":{"id":"merch_1","name":"Pret A Manger"}
                    },
                    {
                        "id":"tx_2",
                        "account_id":"acc_1",
                        "amount":2000,
                        "created":"2024-01-20T17:45:00Z",
                        "currency":"GBP",
                        "description":"Top up",
                        "category":"general",
                        "settled":"",
                        "counterparty":{"name":"Jane"}
                    }
                ]}"#,
            )
            .create_async()
            .await;

        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let transactions = client(&server)
            .transactions(token(), "acc_1", range)
            .await
            .unwrap();

        assert_eq!(transactions[0].amount, -1.5);
        assert_eq!(transactions[0].amount_with_prefix, "-£1.50");
        assert_eq!(transactions[0].counterparty_name, "Pret A Manger");
        assert_eq!(transactions[0].notes, "breakfast");
        assert_eq!(transactions[0].created, "8:30AM 15/01/2024");
        assert!(!transactions[0].amount_is_pending);

        assert_eq!(transactions[1].amount_with_prefix, "£20.00");
        assert_eq!(transactions[1].counterparty_name, "Jane");
        assert_eq!(transactions[1].created, "17:45PM 20/01/2024");
        assert!(transactions[1].amount_is_pending);
    }

    #[tokio::test]
    async fn test_unexpanded_merchant_leaves_counterparty_blank() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/transactions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"transactions":[{
                    "id":"tx_1",
                    "account_id":"acc_1",
                    "amount":-300,
                    "created":"2024-01-15T08:30:00Z",
                    "currency":"GBP",
                    "description":"TESCO",
                    "settled":"2024-01-16T02:00:00Z",
                    "merchant":"merch_1"
                }]}"#,
            )
            .create_async()
            .await;

        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let transactions = client(&server)
            .transactions(token(), "acc_1", range)
            .await
            .unwrap();

        assert_eq!(transactions[0].counterparty_name, "");
        assert_eq!(transactions[0].amount_with_prefix, "-£3.00");
    }
}
