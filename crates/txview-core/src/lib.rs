//! Transaction list state engine
//!
//! Turns a fetched transaction snapshot into the sorted, filtered list a
//! front end renders, runs optimistic deletes against it and remembers the
//! user's sort choice.

pub mod delete;
pub mod error;
pub mod models;
pub mod preferences;
pub mod projection;
pub mod sort;
pub mod source;
pub mod view;

pub use delete::{DeleteCoordinator, DeleteErrorNotice, DeleteOutcome, DeleteTicket};
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use models::{Money, Transaction, TransactionStatus};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use projection::{project, project_with_overlay, Overlay, ProjectionCache};
pub use sort::{SortConfig, SortController, SortField, SortOrder};
pub use source::{FileTransactionSource, SourceError, SourceRef, TransactionSource};
pub use view::{LoadState, TransactionsView, ViewSettings};
