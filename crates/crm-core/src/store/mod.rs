// ── Query cache ──
//
// Keyed query results with request deduplication and push-based change
// notification via `watch` channels.

mod cache;
mod entry;
mod subscription;

pub use cache::CacheStore;
pub use entry::{QueryEntry, QueryStatus};
pub use subscription::Subscription;
