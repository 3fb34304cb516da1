// crm-core: Query cache and mutation layer between crm-api and consumers.

pub mod config;
pub mod convert;
pub mod crm;
pub mod error;
pub mod model;
pub mod mutation;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CacheConfig, CrmConfig, TlsVerification};
pub use crm::Crm;
pub use error::CoreError;
pub use mutation::{ContactMutation, MutationRequest, MutationState};
pub use store::{CacheStore, QueryEntry, QueryStatus, Subscription};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Contact, ContactId, FieldError, KeySegment, QueryKey, ValidationErrors, Validator,
};
