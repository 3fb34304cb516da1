// ── Cache entry state ──

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::QueryKey;

/// Where a query stands. Data exists only in `Success` and an error only
/// in `Error`, so the two can never be observed together.
#[derive(Debug)]
pub enum QueryStatus<T> {
    /// Known key, nothing requested yet (or the first load was abandoned).
    Idle,
    /// First load in flight, no data yet.
    Loading,
    Success(Arc<T>),
    Error(Arc<CoreError>),
}

// Manual impl: cloning shares the `Arc`s and needs no `T: Clone`.
impl<T> Clone for QueryStatus<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Success(data) => Self::Success(Arc::clone(data)),
            Self::Error(err) => Self::Error(Arc::clone(err)),
        }
    }
}

impl<T> QueryStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// `Success` or `Error`.
    pub fn is_settled(&self) -> bool {
        self.is_success() || self.is_error()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

/// Snapshot of one cached query as subscribers see it.
///
/// Every subscriber of a key receives the same `Arc` for `data`/`error`.
#[derive(Debug)]
pub struct QueryEntry<T> {
    pub key: QueryKey,
    pub status: QueryStatus<T>,
    /// A request is in flight. Stays orthogonal to `status`: a background
    /// refetch of a successful entry keeps `Success` until it settles.
    pub is_fetching: bool,
    /// Invalidated since it last settled.
    pub is_stale: bool,
    pub subscriber_count: usize,
    /// When the entry last settled (fetch result or `set_data`).
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Clone for QueryEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status.clone(),
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            subscriber_count: self.subscriber_count,
            updated_at: self.updated_at,
        }
    }
}

impl<T> QueryEntry<T> {
    pub(crate) fn new(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            is_fetching: false,
            is_stale: false,
            subscriber_count: 0,
            updated_at: None,
        }
    }

    pub fn data(&self) -> Option<&Arc<T>> {
        match &self.status {
            QueryStatus::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Arc<CoreError>> {
        match &self.status {
            QueryStatus::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Settled with nothing in flight: what a one-shot consumer waits for.
    pub fn is_settled(&self) -> bool {
        self.status.is_settled() && !self.is_fetching
    }

    pub(crate) fn succeed(&mut self, data: Arc<T>) {
        self.status = QueryStatus::Success(data);
        self.settle();
    }

    pub(crate) fn fail(&mut self, err: Arc<CoreError>) {
        self.status = QueryStatus::Error(err);
        self.settle();
    }

    fn settle(&mut self) {
        self.is_fetching = false;
        self.is_stale = false;
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_idle_and_empty() {
        let entry: QueryEntry<u32> = QueryEntry::new(QueryKey::contacts());
        assert!(matches!(entry.status, QueryStatus::Idle));
        assert!(entry.data().is_none());
        assert!(entry.error().is_none());
        assert!(!entry.is_settled());
    }

    #[test]
    fn failure_drops_previous_data() {
        let mut entry = QueryEntry::new(QueryKey::contacts());
        entry.succeed(Arc::new(1_u32));
        assert_eq!(entry.data().map(|d| **d), Some(1));

        entry.fail(Arc::new(CoreError::RequestFailed {
            message: "HTTP 500".into(),
        }));
        assert!(entry.data().is_none());
        assert!(entry.error().is_some());
        assert_eq!(entry.status.label(), "error");
    }

    #[test]
    fn settling_clears_fetch_and_stale_flags() {
        let mut entry = QueryEntry::new(QueryKey::contacts());
        entry.is_fetching = true;
        entry.is_stale = true;
        entry.succeed(Arc::new(()));
        assert!(!entry.is_fetching);
        assert!(!entry.is_stale);
        assert!(entry.updated_at.is_some());
        assert!(entry.is_settled());
    }
}
