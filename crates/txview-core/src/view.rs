//! Transaction list view state
//!
//! [`TransactionsView`] is what a front end talks to. It owns the latest
//! snapshot, the delete coordinator, the sort controller and the detail
//! selection, and hands out the projection computed from them. Methods take
//! `&self` so a fetch, a delete and renders can interleave on one task; no
//! lock is held across an `.await`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use txview_config::Config;

use crate::delete::{DeleteCoordinator, DeleteErrorNotice, DeleteOutcome};
use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::Transaction;
use crate::preferences::PreferenceStore;
use crate::projection::{project_with_overlay, ProjectionCache, ProjectionKey};
use crate::sort::{SortConfig, SortController, SortField, SortOrder};
use crate::source::SourceRef;

/// Settings a view is created with
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub user_id: String,
    pub sort_key: String,
    pub delete_error_ttl: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ViewSettings {
    fn from(config: &Config) -> Self {
        Self {
            user_id: config.source.user_id.clone(),
            sort_key: config.preferences.sort_key.clone(),
            delete_error_ttl: Duration::from_secs(config.notifications.delete_error_ttl_secs),
        }
    }
}

/// What the list area should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadState {
    /// No snapshot yet and no error
    Loading,
    /// No snapshot and the last fetch failed
    Failed { message: String },
    /// A snapshot exists but nothing is visible
    Empty,
    /// Rows to render
    Ready,
}

#[derive(Debug, Default)]
struct SnapshotState {
    snapshot: Option<Arc<[Transaction]>>,
    revision: u64,
    fetch_error: Option<String>,
    requested: u64,
    applied: u64,
}

/// Transaction list state for one user
pub struct TransactionsView {
    settings: ViewSettings,
    source: SourceRef,
    logger: Arc<dyn ErrorLogger>,
    snapshot: RwLock<SnapshotState>,
    deletes: RwLock<DeleteCoordinator>,
    sort: RwLock<SortController>,
    selection: RwLock<Option<String>>,
    cache: Mutex<ProjectionCache>,
    epoch: AtomicU64,
}

impl TransactionsView {
    /// Create a view; the stored sort preference is restored immediately
    pub fn new(settings: ViewSettings, source: SourceRef, store: Arc<dyn PreferenceStore>) -> Self {
        let sort = SortController::load(store, &settings.sort_key);
        Self {
            settings,
            source,
            logger: Arc::new(DefaultErrorLogger),
            snapshot: RwLock::new(SnapshotState::default()),
            deletes: RwLock::new(DeleteCoordinator::default()),
            sort: RwLock::new(sort),
            selection: RwLock::new(None),
            cache: Mutex::new(ProjectionCache::default()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Replace the error logger
    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    fn context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new(operation).with_user_id(&self.settings.user_id)
    }

    // ==================== Fetching ====================

    /// Fetch the snapshot again.
    ///
    /// On failure the previous snapshot stays in place and the error is kept
    /// for [`fetch_error`](Self::fetch_error). Responses overtaken by a newer
    /// request, or arriving after [`close`](Self::close), are dropped.
    pub async fn refresh(&self) -> CoreResult<()> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let request = {
            let mut state = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            state.requested += 1;
            state.requested
        };

        log::debug!("Fetching transactions for {} (request {})", self.settings.user_id, request);
        let result = self.source.fetch_transactions(&self.settings.user_id).await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            log::debug!("Dropping fetch result {} for a closed view", request);
            let mut state = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            state.applied = state.applied.max(request);
            return Err(CoreError::SessionClosed);
        }

        let fresh = {
            let mut state = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            if request < state.applied {
                log::debug!("Dropping stale fetch result {}", request);
                return Ok(());
            }
            state.applied = request;

            match result {
                Ok(transactions) => {
                    let snapshot: Arc<[Transaction]> = transactions.into();
                    state.snapshot = Some(Arc::clone(&snapshot));
                    state.revision += 1;
                    state.fetch_error = None;
                    snapshot
                }
                Err(e) => {
                    state.fetch_error = Some(e.to_string());
                    drop(state);
                    let error = CoreError::FetchFailed { source: e };
                    self.logger.log_error(&error, &self.context("fetch_transactions"));
                    return Err(error);
                }
            }
        };

        self.deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reconcile(&fresh);
        log::info!("Loaded {} transactions", fresh.len());
        Ok(())
    }

    /// Raw snapshot as last fetched, without local changes
    pub fn snapshot(&self) -> Option<Arc<[Transaction]>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    pub fn fetch_error(&self) -> Option<String> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fetch_error
            .clone()
    }

    /// Whether a fetch is outstanding
    pub fn is_loading(&self) -> bool {
        let state = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        state.requested > state.applied
    }

    pub fn load_state(&self) -> LoadState {
        let (has_snapshot, error) = {
            let state = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            (state.snapshot.is_some(), state.fetch_error.clone())
        };

        match (has_snapshot, error) {
            (false, Some(message)) => LoadState::Failed { message },
            (false, None) => LoadState::Loading,
            (true, _) if self.transactions().is_empty() => LoadState::Empty,
            (true, _) => LoadState::Ready,
        }
    }

    // ==================== Projection ====================

    /// The ordered, filtered sequence to render
    pub fn transactions(&self) -> Arc<[Transaction]> {
        let (snapshot, snapshot_revision) = {
            let state = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            (state.snapshot.clone(), state.revision)
        };
        let overlay_revision = self
            .deletes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision();
        let sort = self.sort_config();

        let key = ProjectionKey {
            snapshot_revision,
            overlay_revision,
            sort,
        };
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get_or_compute(key, || {
            let deletes = self.deletes.read().unwrap_or_else(PoisonError::into_inner);
            project_with_overlay(snapshot.as_deref(), deletes.overlay(), &sort)
        })
    }

    /// How many projections were computed so far
    pub fn projection_computations(&self) -> u64 {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .computations()
    }

    // ==================== Sorting ====================

    pub fn sort_config(&self) -> SortConfig {
        self.sort.read().unwrap_or_else(PoisonError::into_inner).current()
    }

    /// Select a sort field; see [`SortController::set_sort`]
    pub fn set_sort(&self, field: SortField, order: Option<SortOrder>) -> SortConfig {
        self.sort
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_sort(field, order)
    }

    /// Select a sort from its `field-order` form
    pub fn set_sort_str(&self, value: &str) -> CoreResult<SortConfig> {
        self.sort
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_sort_str(value)
    }

    pub fn sort_indicator(&self, field: SortField) -> &'static str {
        self.sort_config().indicator(field)
    }

    // ==================== Deleting ====================

    /// Delete a pending authorization optimistically.
    ///
    /// The row disappears from [`transactions`](Self::transactions) before
    /// the source is called. On success a refresh is issued; a failing
    /// refresh only shows up as a fetch error. On failure the row comes back
    /// and [`delete_error`](Self::delete_error) is set.
    pub async fn delete_authorization(&self, transaction_id: &str) -> CoreResult<()> {
        let ticket = self
            .deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .begin(transaction_id, Utc::now())?;

        {
            let mut selection = self.selection.write().unwrap_or_else(PoisonError::into_inner);
            if selection.as_deref() == Some(transaction_id) {
                *selection = None;
            }
        }

        log::info!("Deleting authorization {}", ticket.transaction_id());
        let result = self.source.delete_authorization(transaction_id).await;

        let outcome = self
            .deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .settle(ticket, &result, Utc::now());

        match (outcome, result) {
            (DeleteOutcome::Discarded, _) => Err(CoreError::SessionClosed),
            (DeleteOutcome::Deleted, _) => {
                if let Err(e) = self.refresh().await {
                    self.logger.log_warning(
                        &format!("Refresh after deleting {} failed: {}", transaction_id, e),
                        &self.context("delete_authorization"),
                    );
                }
                Ok(())
            }
            (DeleteOutcome::RolledBack, Err(source)) => {
                let error = CoreError::DeleteFailed {
                    id: transaction_id.to_string(),
                    source,
                };
                self.logger.log_error(
                    &error,
                    &self
                        .context("delete_authorization")
                        .with_data("transaction_id", serde_json::json!(transaction_id)),
                );
                Err(error)
            }
            (DeleteOutcome::RolledBack, Ok(())) => Err(CoreError::InternalError {
                message: format!("delete of {} rolled back without an error", transaction_id),
            }),
        }
    }

    /// Whether a delete is in flight; delete controls should be disabled
    pub fn is_deleting(&self) -> bool {
        self.deletes.read().unwrap_or_else(PoisonError::into_inner).is_busy()
    }

    pub fn pending_delete(&self) -> Option<String> {
        self.deletes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pending()
            .map(str::to_string)
    }

    pub fn delete_error(&self) -> Option<DeleteErrorNotice> {
        self.deletes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .error()
            .cloned()
    }

    pub fn dismiss_delete_error(&self) {
        self.deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .dismiss_error();
    }

    /// Drop the delete error notice once it outlived the configured lifetime
    pub fn expire_notices(&self, now: DateTime<Utc>) -> bool {
        self.deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .expire_error(now, self.settings.delete_error_ttl)
    }

    // ==================== Detail selection ====================

    /// Show a visible transaction in the detail overlay
    pub fn select(&self, transaction_id: &str) -> CoreResult<Transaction> {
        let transaction = self
            .transactions()
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| CoreError::TransactionNotFound { id: transaction_id.to_string() })?;

        *self.selection.write().unwrap_or_else(PoisonError::into_inner) = Some(transaction_id.to_string());
        Ok(transaction)
    }

    /// The selected transaction, if it is still visible
    pub fn selected(&self) -> Option<Transaction> {
        let id = self.selection.read().unwrap_or_else(PoisonError::into_inner).clone()?;
        self.transactions().iter().find(|t| t.id == id).cloned()
    }

    pub fn clear_selection(&self) {
        *self.selection.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    // ==================== Teardown ====================

    /// Tear the view down. Results of in-flight calls are discarded.
    pub fn close(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.deletes.write().unwrap_or_else(PoisonError::into_inner).reset();
        self.clear_selection();
        log::debug!("View for {} closed", self.settings.user_id);
    }
}

impl std::fmt::Debug for TransactionsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionsView")
            .field("settings", &self.settings)
            .field("sort", &self.sort_config())
            .field("deleting", &self.is_deleting())
            .finish()
    }
}
