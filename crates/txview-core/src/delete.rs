//! Optimistic delete coordination
//!
//! A delete goes `idle -> pending -> settled`. On [`DeleteCoordinator::begin`]
//! the target is marked deleted in the overlay so the next projection already
//! hides it. Success keeps the marker until a refetch carries the server's
//! own; failure drops it and raises a [`DeleteErrorNotice`].
//!
//! Only one delete may be pending per coordinator, whatever the target id.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::models::Transaction;
use crate::projection::Overlay;
use crate::source::SourceError;

/// Handle for one in-flight delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    transaction_id: String,
    epoch: u64,
}

impl DeleteTicket {
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }
}

/// How a settled delete was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The source confirmed; the overlay marker stays
    Deleted,
    /// The source failed; the overlay marker was dropped
    RolledBack,
    /// The coordinator was reset while the call was in flight
    Discarded,
}

/// Dismissible notice shown after a failed delete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteErrorNotice {
    pub transaction_id: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl DeleteErrorNotice {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.raised_at).to_std().map_or(false, |age| age >= ttl)
    }
}

/// Owns the optimistic overlay and the delete busy/error state
#[derive(Debug, Default)]
pub struct DeleteCoordinator {
    overlay: Overlay,
    revision: u64,
    pending: Option<String>,
    error: Option<DeleteErrorNotice>,
    epoch: u64,
}

impl DeleteCoordinator {
    /// Start a delete: mark the target deleted locally and go pending
    pub fn begin(&mut self, transaction_id: &str, now: DateTime<Utc>) -> CoreResult<DeleteTicket> {
        if let Some(pending) = &self.pending {
            return Err(CoreError::DeleteInProgress { id: pending.clone() });
        }

        self.overlay.insert(
            transaction_id.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        self.revision += 1;
        self.pending = Some(transaction_id.to_string());
        self.error = None;

        log::debug!("Optimistically hid {}", transaction_id);
        Ok(DeleteTicket {
            transaction_id: transaction_id.to_string(),
            epoch: self.epoch,
        })
    }

    /// Apply the source's answer for a ticket
    pub fn settle(
        &mut self,
        ticket: DeleteTicket,
        result: &Result<(), SourceError>,
        now: DateTime<Utc>,
    ) -> DeleteOutcome {
        if ticket.epoch != self.epoch {
            log::debug!(
                "Discarding delete result for {} from a closed view",
                ticket.transaction_id
            );
            return DeleteOutcome::Discarded;
        }

        if self.pending.as_deref() == Some(ticket.transaction_id.as_str()) {
            self.pending = None;
        }

        match result {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) => {
                if self.overlay.remove(&ticket.transaction_id).is_some() {
                    self.revision += 1;
                }
                self.error = Some(DeleteErrorNotice {
                    transaction_id: ticket.transaction_id,
                    message: e.to_string(),
                    raised_at: now,
                });
                DeleteOutcome::RolledBack
            }
        }
    }

    /// Drop markers the server has caught up with.
    ///
    /// A marker goes once its record is gone from the snapshot or already
    /// carries a server-side `deleted` value. Returns how many were dropped.
    pub fn reconcile(&mut self, snapshot: &[Transaction]) -> usize {
        let live: HashSet<&str> = snapshot
            .iter()
            .filter(|t| !t.is_deleted())
            .map(|t| t.id.as_str())
            .collect();

        let before = self.overlay.len();
        self.overlay.retain(|id, _| live.contains(id.as_str()));
        let dropped = before - self.overlay.len();
        if dropped > 0 {
            self.revision += 1;
            log::debug!("Reconciled {} optimistic markers", dropped);
        }
        dropped
    }

    /// Forget everything; results of in-flight deletes will be discarded
    pub fn reset(&mut self) {
        self.overlay.clear();
        self.pending = None;
        self.error = None;
        self.revision += 1;
        self.epoch += 1;
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Bumped whenever the overlay changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn error(&self) -> Option<&DeleteErrorNotice> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Clear the error notice once it outlived `ttl`
    pub fn expire_error(&mut self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match &self.error {
            Some(notice) if notice.is_expired(now, ttl) => {
                self.error = None;
                true
            }
            _ => false,
        }
    }
}
