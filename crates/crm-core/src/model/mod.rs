// ── Domain model ──
//
// The contact record, the keys that name cached queries, and the
// field-level validation applied before a payload reaches the backend.

mod contact;
mod query_key;
mod validation;

pub use contact::{Contact, ContactId, EMAIL_FIELD, FIRST_NAME_FIELD, LAST_NAME_FIELD};
pub use query_key::{KeySegment, QueryKey};
pub use validation::{FieldError, ValidationErrors, Validator};
