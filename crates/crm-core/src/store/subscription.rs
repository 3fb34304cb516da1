// ── Cache subscriptions ──

use std::sync::Arc;

use tokio::sync::watch;

use super::cache::Slot;
use super::entry::QueryEntry;
use crate::model::QueryKey;

/// A live view of one cache entry.
///
/// Holding a `Subscription` keeps the entry "observed": `invalidate` only
/// refetches observed keys, and dropping the last subscription cancels any
/// request still in flight.
pub struct Subscription<T: Send + Sync + 'static> {
    slot: Arc<Slot<T>>,
    receiver: watch::Receiver<QueryEntry<T>>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(slot: Arc<Slot<T>>, receiver: watch::Receiver<QueryEntry<T>>) -> Self {
        Self { slot, receiver }
    }

    pub fn key(&self) -> &QueryKey {
        self.slot.key()
    }

    /// Latest published entry.
    pub fn state(&self) -> QueryEntry<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<QueryEntry<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the entry has settled (success or error) with nothing in
    /// flight, then return it. Returns immediately if it already has.
    pub async fn settled(&mut self) -> QueryEntry<T> {
        if let Ok(entry) = self.receiver.wait_for(QueryEntry::is_settled).await {
            return entry.clone();
        }
        self.receiver.borrow().clone()
    }

    /// Stop observing. Same as dropping.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T: Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.slot.detach();
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entry = self.receiver.borrow();
        f.debug_struct("Subscription")
            .field("key", self.slot.key())
            .field("status", &entry.status.label())
            .field("is_fetching", &entry.is_fetching)
            .finish()
    }
}
