//! Transaction data model as delivered by the transaction source

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction status
///
/// Unknown statuses are kept verbatim so they still sort and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    /// Pending card authorization, the only deletable status
    Authorization,
    /// Booked transaction
    Financial,
    /// Scheduled transaction
    Future,
    /// Any other status reported by the source
    Other(String),
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Authorization => "authorization",
            TransactionStatus::Financial => "financial",
            TransactionStatus::Future => "future",
            TransactionStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "authorization" => TransactionStatus::Authorization,
            "financial" => TransactionStatus::Financial,
            "future" => TransactionStatus::Future,
            _ => TransactionStatus::Other(value),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Amount in a currency; negative values are debits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    /// Serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// A transaction as received from the source. Never constructed by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier, stable across refetches
    pub id: String,
    /// ISO 8601 timestamp
    pub time: String,
    pub status: TransactionStatus,
    pub localizable_title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "categoryID", default)]
    pub category_id: String,
    /// Amount used for sorting and display
    pub billing_amount: Money,
    /// Original-currency amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_amount: Option<Money>,
    #[serde(rename = "iconURL", default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_icon_url: Option<String>,
    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
}

impl Transaction {
    /// Whether the record is soft-deleted; an empty marker does not count
    pub fn is_deleted(&self) -> bool {
        self.deleted.as_deref().map_or(false, |d| !d.is_empty())
    }

    /// Only pending authorizations may be deleted
    pub fn is_deletable(&self) -> bool {
        self.status == TransactionStatus::Authorization
    }

    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        txview_utils::parse_timestamp(&self.time)
    }

    /// Milliseconds since the epoch, used for chronological ordering
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.timestamp().map(|dt| dt.timestamp_millis())
    }

    /// Negative billing amounts are debits
    pub fn is_debit(&self) -> bool {
        self.billing_amount.amount.is_sign_negative() && !self.billing_amount.amount.is_zero()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::str::FromStr;

    /// Build a transaction for tests
    pub fn tx(id: &str, time: &str, status: &str, title: &str, amount: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            time: time.to_string(),
            status: TransactionStatus::from(status.to_string()),
            localizable_title: title.to_string(),
            kind: "card".to_string(),
            category_id: "shopping".to_string(),
            billing_amount: Money {
                amount: Decimal::from_str(amount).unwrap(),
                currency: "EUR".to_string(),
            },
            transaction_amount: None,
            icon_url: None,
            category_icon_url: None,
            deleted: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "tx-1",
        "time": "2024-05-01T10:00:00Z",
        "status": "authorization",
        "localizableTitle": "Coffee Shop",
        "type": "card",
        "categoryID": "food",
        "billingAmount": { "amount": -4.5, "currency": "EUR" },
        "transactionAmount": { "amount": -5, "currency": "USD" },
        "iconURL": "https://example.com/icon.png"
    }"#;

    #[test]
    fn test_deserialize_transaction() {
        let tx: Transaction = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(tx.id, "tx-1");
        assert_eq!(tx.status, TransactionStatus::Authorization);
        assert_eq!(tx.kind, "card");
        assert_eq!(tx.category_id, "food");
        assert_eq!(tx.billing_amount.amount.to_string(), "-4.5");
        assert_eq!(tx.transaction_amount.as_ref().map(|m| m.currency.as_str()), Some("USD"));
        assert_eq!(tx.icon_url.as_deref(), Some("https://example.com/icon.png"));
        assert!(tx.deleted.is_none());
        assert!(tx.is_deletable());
        assert!(tx.is_debit());
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let json = SAMPLE.replace("\"authorization\"", "\"reversed\"");
        let tx: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.status, TransactionStatus::Other("reversed".to_string()));
        assert!(!tx.is_deletable());

        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back["status"], "reversed");
    }

    #[test]
    fn test_amounts_serialize_as_numbers() {
        let tx: Transaction = serde_json::from_str(SAMPLE).unwrap();
        let value = serde_json::to_value(&tx).unwrap();
        assert!(value["billingAmount"]["amount"].is_number());
        assert_eq!(value["billingAmount"]["amount"].as_f64(), Some(-4.5));
        assert_eq!(value["transactionAmount"]["amount"].as_f64(), Some(-5.0));

        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back.billing_amount, tx.billing_amount);
    }

    #[test]
    fn test_is_deleted() {
        let mut tx = fixtures::tx("a", "2024-01-01", "financial", "A", "1");
        assert!(!tx.is_deleted());
        tx.deleted = Some(String::new());
        assert!(!tx.is_deleted());
        tx.deleted = Some("2024-05-02T08:00:00Z".to_string());
        assert!(tx.is_deleted());
    }

    #[test]
    fn test_timestamp_millis() {
        let tx = fixtures::tx("a", "1970-01-01T00:00:01Z", "financial", "A", "1");
        assert_eq!(tx.timestamp_millis(), Some(1000));

        let tx = fixtures::tx("b", "garbage", "financial", "B", "1");
        assert_eq!(tx.timestamp_millis(), None);
    }
}
