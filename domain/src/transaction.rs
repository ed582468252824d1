//! Normalized transaction shape, amount rendering and running balance.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Display format for `Transaction::created`, e.g. `14:05PM 06/03/2018`. The hour is 24-hour.
pub const CREATED_FORMAT: &str = "%-H:%M%p %d/%m/%Y";

/// Currency assumed for the balance of an empty list.
const DEFAULT_CURRENCY: &str = "GBP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// 1-based position in the list it was returned in.
    pub id: u32,
    pub account_id: String,
    /// Major currency units; negative for money leaving the account.
    pub amount: f64,
    pub amount_with_prefix: String,
    pub amount_is_pending: bool,
    pub category: String,
    pub counterparty_name: String,
    pub created: String,
    pub currency: String,
    pub description: String,
    pub notes: String,
}

/// Transactions for one account plus their sum.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionList {
    pub results: Vec<Transaction>,
    pub balance: f64,
    pub balance_with_prefix: String,
}

impl TransactionList {
    /// Numbers the transactions from 1 in their current order and totals them.
    pub fn new(mut results: Vec<Transaction>) -> Self {
        for (index, transaction) in results.iter_mut().enumerate() {
            transaction.id = index as u32 + 1;
        }

        let balance = balance(&results);
        let currency = results
            .first()
            .map(|t| t.currency.as_str())
            .unwrap_or(DEFAULT_CURRENCY);
        let balance_with_prefix = format_amount(balance, currency);

        Self {
            results,
            balance,
            balance_with_prefix,
        }
    }
}

/// Sum of the transaction amounts, rounded to two decimals.
pub fn balance(transactions: &[Transaction]) -> f64 {
    round_to_cents(transactions.iter().map(|t| t.amount).sum())
}

/// Converts an integer amount in minor units (pence, cents) to major units.
pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Renders an amount with its sign and currency symbol, always with two decimals.
///
/// `-1.5` in GBP becomes `-£1.50`. Currencies without a known symbol use their code:
/// `CHF 3.00`.
pub fn format_amount(amount: f64, currency: &str) -> String {
    let amount = round_to_cents(amount);
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}{:.2}", sign, currency_prefix(currency), amount.abs())
}

fn currency_prefix(currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "GBP" => "£".to_string(),
        "EUR" => "€".to_string(),
        "USD" => "$".to_string(),
        other => format!("{other} "),
    }
}

fn round_to_cents(amount: f64) -> f64 {
    let rounded = (amount * 100.0).round() / 100.0;
    // Avoid rendering "-£0.00".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Formats a gateway timestamp with `CREATED_FORMAT`, in the offset the gateway sent.
///
/// Accepts RFC 3339 and offset-less `YYYY-MM-DDTHH:MM:SS[.fff]`. Anything else is
/// passed through unchanged.
pub fn format_created(timestamp: &str) -> String {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(timestamp) {
        return datetime.format(CREATED_FORMAT).to_string();
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return datetime.format(CREATED_FORMAT).to_string();
    }
    timestamp.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(amount: f64) -> Transaction {
        Transaction {
            amount,
            currency: "GBP".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_minor_units_render_with_sign_before_symbol() {
        let amount = from_minor_units(-150);
        assert_eq!(amount, -1.5);
        assert_eq!(format_amount(amount, "GBP"), "-£1.50");
    }

    #[test]
    fn test_major_units_render_with_two_decimals() {
        assert_eq!(format_amount(23.5, "GBP"), "£23.50");
        assert_eq!(format_amount(7.0, "EUR"), "€7.00");
        assert_eq!(format_amount(-0.001, "USD"), "$0.00");
        assert_eq!(format_amount(3.0, "chf"), "CHF 3.00");
    }

    #[test]
    fn test_balance_sums_amounts() {
        let transactions = vec![transaction(10.0), transaction(-3.5), transaction(2.25)];
        assert_eq!(balance(&transactions), 8.75);
    }

    #[test]
    fn test_balance_rounds_float_noise() {
        let transactions = vec![transaction(0.1), transaction(0.2)];
        assert_eq!(balance(&transactions), 0.3);
    }

    #[test]
    fn test_list_numbers_from_one_and_renders_balance() {
        let list = TransactionList::new(vec![
            transaction(10.0),
            transaction(-3.5),
            transaction(2.25),
        ]);

        let ids: Vec<u32> = list.results.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(list.balance, 8.75);
        assert_eq!(list.balance_with_prefix, "£8.75");
    }

    #[test]
    fn test_empty_list_has_zero_balance() {
        let list = TransactionList::new(vec![]);
        assert_eq!(list.balance, 0.0);
        assert_eq!(list.balance_with_prefix, "£0.00");
    }

    #[test]
    fn test_format_created() {
        assert_eq!(format_created("2018-03-06T14:05:00+00:00"), "14:05PM 06/03/2018");
        assert_eq!(format_created("2015-08-22T12:20:18.647Z"), "12:20PM 22/08/2015");
        assert_eq!(format_created("2021-09-01T00:00:00"), "0:00AM 01/09/2021");
        assert_eq!(format_created("2021-09-01T23:59:00Z"), "23:59PM 01/09/2021");
        assert_eq!(format_created("yesterday"), "yesterday");
    }
}
