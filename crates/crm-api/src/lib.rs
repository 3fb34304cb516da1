// crm-api: Async Rust client for the contacts REST backend

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ContactsClient;
pub use error::Error;
pub use models::ContactRecord;
pub use transport::{TlsMode, TransportConfig};
