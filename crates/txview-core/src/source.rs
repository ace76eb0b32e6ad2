//! Remote transaction source
//!
//! The fetch and delete calls are opaque to the engine; anything that
//! implements [`TransactionSource`] can feed a view.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::Transaction;

/// Errors reported by a transaction source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("source unavailable: {message}")]
    Unavailable { message: String },

    #[error("request rejected: {message}")]
    Rejected { message: String },

    #[error("transaction not found: {id}")]
    NotFound { id: String },

    #[error("malformed response: {message}")]
    Malformed { message: String },
}

/// Source reference type
pub type SourceRef = Arc<dyn TransactionSource>;

/// Asynchronous, fail-capable access to a user's transactions
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch the full transaction list for a user
    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, SourceError>;

    /// Soft-delete a pending authorization
    async fn delete_authorization(&self, transaction_id: &str) -> Result<(), SourceError>;
}

/// On-disk layout accepted by [`FileTransactionSource`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum TransactionFile {
    Wrapped { transactions: Vec<Transaction> },
    Bare(Vec<Transaction>),
}

impl TransactionFile {
    fn into_transactions(self) -> Vec<Transaction> {
        match self {
            TransactionFile::Wrapped { transactions } => transactions,
            TransactionFile::Bare(transactions) => transactions,
        }
    }
}

/// Source backed by a JSON file.
///
/// The file holds either a bare array or `{"transactions": [...]}`. Deletes
/// stamp `deleted` on the record and rewrite the file. The user id is not
/// used to partition the data.
#[derive(Debug)]
pub struct FileTransactionSource {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTransactionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<Transaction>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| SourceError::Unavailable {
            message: format!("{}: {}", self.path.display(), e),
        })?;
        let file: TransactionFile = serde_json::from_str(&content).map_err(|e| SourceError::Malformed {
            message: e.to_string(),
        })?;
        Ok(file.into_transactions())
    }

    async fn write_all(&self, transactions: Vec<Transaction>) -> Result<(), SourceError> {
        let file = TransactionFile::Wrapped { transactions };
        let content = serde_json::to_string_pretty(&file).map_err(|e| SourceError::Malformed {
            message: e.to_string(),
        })?;
        // the data file is only ever replaced whole
        let staging = self.staging_path();
        tokio::fs::write(&staging, content).await.map_err(|e| SourceError::Unavailable {
            message: format!("{}: {}", staging.display(), e),
        })?;
        tokio::fs::rename(&staging, &self.path).await.map_err(|e| SourceError::Unavailable {
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl TransactionSource for FileTransactionSource {
    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, SourceError> {
        let transactions = self.read_all().await?;
        log::debug!(
            "Fetched {} transactions for {} from {}",
            transactions.len(),
            user_id,
            self.path.display()
        );
        Ok(transactions)
    }

    async fn delete_authorization(&self, transaction_id: &str) -> Result<(), SourceError> {
        let _guard = self.write_lock.lock().await;
        let mut transactions = self.read_all().await?;

        let target = transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| SourceError::NotFound { id: transaction_id.to_string() })?;

        if !target.is_deletable() {
            return Err(SourceError::Rejected {
                message: format!("transaction {} has status {}", transaction_id, target.status),
            });
        }
        if target.is_deleted() {
            return Err(SourceError::Rejected {
                message: format!("transaction {} is already deleted", transaction_id),
            });
        }

        target.deleted = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        self.write_all(transactions).await?;
        log::info!("Deleted authorization {}", transaction_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::tx;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("txview-source-{}-{}.json", name, std::process::id()))
    }

    async fn write_fixture(path: &PathBuf, transactions: Vec<Transaction>) {
        let content = serde_json::to_string(&transactions).unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_bare_and_wrapped() {
        let path = temp_path("fetch");
        write_fixture(&path, vec![tx("a", "2024-01-01", "financial", "A", "1")]).await;

        let source = FileTransactionSource::new(&path);
        let fetched = source.fetch_transactions("user").await.unwrap();
        assert_eq!(fetched.len(), 1);

        let wrapped = serde_json::json!({ "transactions": [tx("b", "2024-01-02", "future", "B", "2")] });
        tokio::fs::write(&path, wrapped.to_string()).await.unwrap();
        let fetched = source.fetch_transactions("user").await.unwrap();
        assert_eq!(fetched[0].id, "b");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let source = FileTransactionSource::new(temp_path("missing-file-never-created"));
        assert!(matches!(
            source.fetch_transactions("user").await,
            Err(SourceError::Unavailable { .. })
        ));

        let path = temp_path("malformed");
        tokio::fs::write(&path, "{\"transactions\": 3}").await.unwrap();
        let source = FileTransactionSource::new(&path);
        assert!(matches!(
            source.fetch_transactions("user").await,
            Err(SourceError::Malformed { .. })
        ));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_delete_authorization_rules() {
        let path = temp_path("delete");
        write_fixture(
            &path,
            vec![
                tx("auth", "2024-01-01", "authorization", "Pending", "-10"),
                tx("booked", "2024-01-02", "financial", "Booked", "-20"),
            ],
        )
        .await;
        let source = FileTransactionSource::new(&path);

        source.delete_authorization("auth").await.unwrap();
        let fetched = source.fetch_transactions("user").await.unwrap();
        assert!(fetched.iter().find(|t| t.id == "auth").unwrap().is_deleted());

        assert!(matches!(source.delete_authorization("auth").await, Err(SourceError::Rejected { .. })));
        assert!(matches!(source.delete_authorization("booked").await, Err(SourceError::Rejected { .. })));
        assert!(matches!(source.delete_authorization("nope").await, Err(SourceError::NotFound { .. })));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_delete_rewrites_file_in_place_with_numeric_amounts() {
        let path = temp_path("rewrite");
        let file = serde_json::json!({
            "transactions": [{
                "id": "a",
                "time": "2024-05-01T10:00:00Z",
                "status": "authorization",
                "localizableTitle": "Coffee",
                "type": "card",
                "categoryID": "food",
                "billingAmount": { "amount": -4.5, "currency": "EUR" }
            }]
        });
        tokio::fs::write(&path, file.to_string()).await.unwrap();

        let source = FileTransactionSource::new(&path);
        source.delete_authorization("a").await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &value["transactions"][0];
        assert!(record["billingAmount"]["amount"].is_number());
        assert_eq!(record["billingAmount"]["amount"].as_f64(), Some(-4.5));
        assert!(record["deleted"].is_string());
        assert!(!source.staging_path().exists());
        let _ = tokio::fs::remove_file(&path).await;
    }
}
