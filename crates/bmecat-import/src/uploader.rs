//! Batched upserts with failure isolation.
//!
//! A failed group is split in half and each half retried, recursively, until
//! the failing members are isolated as singletons. One bad payload therefore
//! costs O(log n) extra calls instead of blocking its whole batch.

use std::collections::HashMap;
use std::ops::Range;

use serde::Serialize;

use crate::backend::SyncTarget;

/// Products per sync call unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// A singleton that the shop refused, by position within the submitted slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub uploaded: usize,
    /// In ascending index order.
    pub rejected: Vec<Rejection>,
}

/// Upsert `items`, bisecting on failure until every failing item is
/// isolated.
///
/// Ranges are processed left half first, so sync calls follow the input
/// order. Transport failures are treated like rejections.
pub async fn upsert_isolating<B, T>(target: &B, entity: &str, items: &[T]) -> BatchOutcome
where
    B: SyncTarget + ?Sized,
    T: Serialize + Sync,
{
    let mut outcome = BatchOutcome::default();
    let mut pending: Vec<Range<usize>> = vec![0..items.len()];

    while let Some(range) = pending.pop() {
        if range.is_empty() {
            continue;
        }
        match target.sync_upsert(entity, &items[range.clone()]).await {
            Ok(()) => outcome.uploaded += range.len(),
            Err(e) if range.len() == 1 => {
                tracing::warn!(entity, index = range.start, error = %e, "item rejected");
                outcome.rejected.push(Rejection {
                    index: range.start,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                tracing::debug!(
                    entity,
                    start = range.start,
                    len = range.len(),
                    error = %e,
                    "group failed, bisecting"
                );
                let mid = range.start + range.len() / 2;
                pending.push(mid..range.end);
                pending.push(range.start..mid);
            }
        }
    }

    outcome
}

/// Rejected items handed back from a flush, with the shop's reason.
pub struct FlushReport<T> {
    pub uploaded: usize,
    pub rejected: Vec<(T, String)>,
}

/// Buffers payloads and uploads them in groups of at most `batch_size`.
pub struct BatchUploader<T> {
    entity: &'static str,
    batch_size: usize,
    pending: Vec<T>,
}

impl<T: Serialize + Sync> BatchUploader<T> {
    #[must_use]
    pub fn new(entity: &'static str, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            entity,
            batch_size,
            pending: Vec::with_capacity(batch_size),
        }
    }

    /// Queue an item. Returns `true` once the buffer holds a full batch.
    pub fn push(&mut self, item: T) -> bool {
        self.pending.push(item);
        self.pending.len() >= self.batch_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Upload everything buffered and clear the buffer.
    pub async fn flush<B>(&mut self, target: &B) -> FlushReport<T>
    where
        B: SyncTarget + ?Sized,
    {
        let batch = std::mem::take(&mut self.pending);
        let outcome = upsert_isolating(target, self.entity, &batch).await;

        let mut reasons: HashMap<usize, String> = outcome
            .rejected
            .into_iter()
            .map(|r| (r.index, r.reason))
            .collect();
        let rejected = if reasons.is_empty() {
            Vec::new()
        } else {
            batch
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| reasons.remove(&i).map(|reason| (item, reason)))
                .collect()
        };

        FlushReport {
            uploaded: outcome.uploaded,
            rejected,
        }
    }
}

#[cfg(test)]
#[path = "uploader_test.rs"]
mod tests;
