//! Transaction projection: filter soft-deleted records and order the rest
//!
//! Everything here is pure. The same snapshot, overlay and sort config always
//! give the same sequence, which is what lets [`ProjectionCache`] memoize it.

use feruca::Collator;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::Transaction;
use crate::sort::{SortConfig, SortField, SortOrder};

/// Local soft-delete markers layered over a snapshot, keyed by transaction id
pub type Overlay = HashMap<String, String>;

/// Compare strings with the Unicode Collation Algorithm in CLDR root order.
///
/// Letters order before accents and accents before case, so "Éclair" lands
/// among the e's; on a case-only difference lowercase comes first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    Collator::default().collate(a, b)
}

/// Ascending comparison of two transactions by a single field
pub fn compare_by(collator: &mut Collator, field: SortField, a: &Transaction, b: &Transaction) -> Ordering {
    match field {
        // unparseable timestamps order before every parseable one
        SortField::Date => a.timestamp_millis().cmp(&b.timestamp_millis()),
        SortField::Status => collator.collate(a.status.as_str(), b.status.as_str()),
        SortField::Title => collator.collate(a.localizable_title.as_str(), b.localizable_title.as_str()),
        SortField::Amount => a.billing_amount.amount.cmp(&b.billing_amount.amount),
    }
}

/// Derive the display sequence from a snapshot.
///
/// An absent snapshot yields an empty list. Ties keep snapshot order.
pub fn project(snapshot: Option<&[Transaction]>, sort: &SortConfig) -> Vec<Transaction> {
    let mut visible: Vec<Transaction> = snapshot
        .unwrap_or_default()
        .iter()
        .filter(|t| !t.is_deleted())
        .cloned()
        .collect();

    let mut collator = Collator::default();
    visible.sort_by(|a, b| {
        let ordering = compare_by(&mut collator, sort.field, a, b);
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    visible
}

/// Apply overlay markers to a snapshot without touching the snapshot itself
pub fn apply_overlay(snapshot: &[Transaction], overlay: &Overlay) -> Vec<Transaction> {
    snapshot
        .iter()
        .map(|t| match overlay.get(&t.id) {
            Some(deleted) if !t.is_deleted() => Transaction {
                deleted: Some(deleted.clone()),
                ..t.clone()
            },
            _ => t.clone(),
        })
        .collect()
}

/// [`project`] over the snapshot as perceived with local overlay markers
pub fn project_with_overlay(
    snapshot: Option<&[Transaction]>,
    overlay: &Overlay,
    sort: &SortConfig,
) -> Vec<Transaction> {
    match snapshot {
        Some(snapshot) if !overlay.is_empty() => {
            let patched = apply_overlay(snapshot, overlay);
            project(Some(&patched), sort)
        }
        _ => project(snapshot, sort),
    }
}

/// Inputs a projection was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionKey {
    pub snapshot_revision: u64,
    pub overlay_revision: u64,
    pub sort: SortConfig,
}

/// Memoizes the last projection; recomputes only when its key changes
#[derive(Debug, Default)]
pub struct ProjectionCache {
    entry: Option<(ProjectionKey, Arc<[Transaction]>)>,
    computations: u64,
}

impl ProjectionCache {
    pub fn get_or_compute<F>(&mut self, key: ProjectionKey, compute: F) -> Arc<[Transaction]>
    where
        F: FnOnce() -> Vec<Transaction>,
    {
        if let Some((cached_key, projection)) = &self.entry {
            if *cached_key == key {
                return Arc::clone(projection);
            }
        }

        let projection: Arc<[Transaction]> = compute().into();
        self.computations += 1;
        log::trace!(
            "Recomputed projection #{} ({} rows, sort {})",
            self.computations,
            projection.len(),
            key.sort
        );
        self.entry = Some((key, Arc::clone(&projection)));
        projection
    }

    /// Number of times a projection was actually computed
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
