//! Per-renderer memo of resolved payloads.
//!
//! Entries live in a bounded LRU sized for the visible rows plus a margin. A
//! resident key, even one holding [`ResolvedPayload::Empty`], means the row is
//! resolved and must not be fetched again. Rows that are being resolved sit in
//! a separate in-flight map so concurrent renders share one pipeline run.

use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;

use crate::{ResolvedPayload, RowId};

/// A resolution that any number of renders can await.
pub type PendingPayload = Shared<BoxFuture<'static, ResolvedPayload>>;

/// Bounded row → payload memo with single-flight resolution.
pub struct CommenterCache {
    entries: Mutex<LruCache<RowId, ResolvedPayload>>,
    in_flight: Mutex<HashMap<RowId, PendingPayload>>,
}

impl CommenterCache {
    /// Empty cache holding at most `capacity` rows.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Cached payload for `row`; refreshes its recency.
    pub fn get(&self, row: RowId) -> Option<ResolvedPayload> {
        self.entries.lock().get(&row).cloned()
    }

    /// Stores `payload`, evicting the least recently used row when full.
    pub fn set(&self, row: RowId, payload: ResolvedPayload) {
        if let Some((evicted, _)) = self.entries.lock().push(row, payload) {
            if evicted != row {
                tracing::debug!(row_id = %evicted, "evicted cached commenter");
            }
        }
    }

    /// Whether `row` is resolved, without touching its recency.
    pub fn contains(&self, row: RowId) -> bool {
        self.entries.lock().contains(&row)
    }

    /// Number of resolved rows held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// `true` when no row is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of rows held.
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().cap()
    }

    /// Number of rows currently being resolved.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Returns the running resolution of `row`, or starts `resolve` as the new
    /// one. The payload is stored and the in-flight slot released as soon as
    /// the shared future completes, whichever waiter drives it.
    pub fn join_or_start<F>(self: &Arc<Self>, row: RowId, resolve: F) -> PendingPayload
    where
        F: FnOnce() -> BoxFuture<'static, ResolvedPayload>,
    {
        let mut in_flight = self.in_flight.lock();
        if let Some(pending) = in_flight.get(&row) {
            tracing::debug!(row_id = %row, "joined in-flight resolution");
            return pending.clone();
        }

        let cache = Arc::clone(self);
        let resolution = resolve();
        let pending = async move {
            let payload = resolution.await;
            cache.complete(row, payload.clone());
            payload
        }
        .boxed()
        .shared();
        in_flight.insert(row, pending.clone());
        pending
    }

    fn complete(&self, row: RowId, payload: ResolvedPayload) {
        self.set(row, payload);
        self.in_flight.lock().remove(&row);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        num::NonZeroUsize,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use futures::FutureExt;

    use super::CommenterCache;
    use crate::{ResolvedPayload, RowId};

    fn row(value: u64) -> RowId {
        RowId::new(value).unwrap()
    }

    fn cache(capacity: usize) -> Arc<CommenterCache> {
        Arc::new(CommenterCache::new(NonZeroUsize::new(capacity).unwrap()))
    }

    #[test]
    fn empty_payload_counts_as_resolved() {
        let cache = cache(4);
        assert!(!cache.contains(row(1)));
        cache.set(row(1), ResolvedPayload::Empty);
        assert!(cache.contains(row(1)));
        assert_eq!(cache.get(row(1)), Some(ResolvedPayload::Empty));
    }

    #[test]
    fn least_recently_used_row_is_evicted() {
        let cache = cache(2);
        cache.set(row(1), ResolvedPayload::text("one"));
        cache.set(row(2), ResolvedPayload::text("two"));
        assert!(cache.get(row(1)).is_some());
        cache.set(row(3), ResolvedPayload::text("three"));

        assert!(cache.contains(row(1)));
        assert!(!cache.contains(row(2)));
        assert!(cache.contains(row(3)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn set_overwrites_existing_row() {
        let cache = cache(2);
        cache.set(row(1), ResolvedPayload::Empty);
        cache.set(row(1), ResolvedPayload::text("later"));
        assert_eq!(cache.get(row(1)), Some(ResolvedPayload::text("later")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_resolutions_share_one_run() {
        let cache = cache(4);
        let runs = Arc::new(AtomicUsize::new(0));

        let start = |runs: Arc<AtomicUsize>| {
            move || {
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    ResolvedPayload::text("shared")
                }
                .boxed()
            }
        };
        let first = cache.join_or_start(row(7), start(runs.clone()));
        let second = cache.join_or_start(row(7), start(runs.clone()));
        assert_eq!(cache.in_flight_len(), 1);

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, ResolvedPayload::text("shared"));
        assert_eq!(a, b);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight_len(), 0);
        assert_eq!(cache.get(row(7)), Some(ResolvedPayload::text("shared")));
    }

    #[tokio::test]
    async fn different_rows_resolve_independently() {
        let cache = cache(4);
        let a = cache.join_or_start(row(1), || async { ResolvedPayload::text("a") }.boxed());
        let b = cache.join_or_start(row(2), || async { ResolvedPayload::Empty }.boxed());
        assert_eq!(cache.in_flight_len(), 2);

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, ResolvedPayload::text("a"));
        assert_eq!(b, ResolvedPayload::Empty);
        assert_eq!(cache.len(), 2);
    }
}
