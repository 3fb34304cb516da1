// ── Application root ──
//
// Owns the backend client, one cache store per value type, and the
// mutation coordinator. Consumers hold a cheap `Crm` clone and subscribe
// by key; fetchers are wired here so every caller shares them.

use std::sync::Arc;

use crm_api::transport::{TlsMode, TransportConfig};
use crm_api::ContactsClient;
use tracing::{debug, info};

use crate::config::{CacheConfig, CrmConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{Contact, ContactId, QueryKey};
use crate::mutation::{ContactMutation, MutationRequest};
use crate::store::{CacheStore, Subscription};

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<CrmInner>`. Must be used from within a Tokio
/// runtime: subscriptions spawn their fetches.
#[derive(Clone)]
pub struct Crm {
    inner: Arc<CrmInner>,
}

struct CrmInner {
    client: Arc<ContactsClient>,
    lists: CacheStore<Vec<Contact>>,
    details: CacheStore<Contact>,
    mutation: ContactMutation,
}

impl Crm {
    /// Build the client from `config`. Fails only on an unusable URL or TLS
    /// setup; nothing touches the network until the first subscription.
    pub fn new(config: CrmConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            ..TransportConfig::default()
        }
        .with_timeout(config.timeout);
        let client = ContactsClient::new(&config.backend_url, &transport)?;
        info!(backend = %client.base_url(), "contacts backend configured");
        Ok(Self::with_client(client, config.cache))
    }

    /// Wrap an already-built client.
    pub fn with_client(client: ContactsClient, cache: CacheConfig) -> Self {
        let client = Arc::new(client);
        Self {
            inner: Arc::new(CrmInner {
                mutation: ContactMutation::new(Arc::clone(&client)),
                lists: CacheStore::new(cache),
                details: CacheStore::new(cache),
                client,
            }),
        }
    }

    pub fn client(&self) -> &ContactsClient {
        &self.inner.client
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Subscribe to `["contacts"]`, the full list.
    pub fn contacts(&self) -> Subscription<Vec<Contact>> {
        let client = Arc::clone(&self.inner.client);
        self.inner.lists.subscribe(QueryKey::contacts(), move || {
            let client = Arc::clone(&client);
            async move {
                let records = client.list().await?;
                Ok::<_, CoreError>(records.into_iter().map(Contact::from).collect())
            }
        })
    }

    /// Subscribe to `["contact", "<id>"]`.
    pub fn contact(&self, id: ContactId) -> Subscription<Contact> {
        let client = Arc::clone(&self.inner.client);
        self.inner.details.subscribe(QueryKey::contact(id), move || {
            let client = Arc::clone(&client);
            async move { Ok::<_, CoreError>(Contact::from(client.get(id.get()).await?)) }
        })
    }

    pub fn list_store(&self) -> &CacheStore<Vec<Contact>> {
        &self.inner.lists
    }

    pub fn detail_store(&self) -> &CacheStore<Contact> {
        &self.inner.details
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn mutation(&self) -> &ContactMutation {
        &self.inner.mutation
    }

    /// Create or update a contact. The caches are left alone; follow up with
    /// [`seed_contact`](Self::seed_contact) or
    /// [`invalidate_contacts`](Self::invalidate_contacts) as needed.
    pub async fn save(&self, request: MutationRequest) -> Result<Contact, CoreError> {
        self.inner.mutation.mutate(request).await
    }

    /// Put a saved contact into the detail cache so its view needs no round
    /// trip. Returns `false` for a contact without an id.
    pub fn seed_contact(&self, contact: &Contact) -> bool {
        let Some(id) = contact.id else {
            return false;
        };
        debug!(%id, "seeding detail cache");
        self.inner
            .details
            .set_data(QueryKey::contact(id), contact.clone());
        true
    }

    /// Mark the list stale and refetch it if anyone is watching.
    pub fn invalidate_contacts(&self) -> bool {
        self.inner.lists.invalidate(&QueryKey::contacts())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cancel every in-flight fetch in both stores.
    pub fn shutdown(&self) {
        self.inner.lists.shutdown();
        self.inner.details.shutdown();
        info!("crm shut down");
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_modes_map_one_to_one() {
        assert!(matches!(
            tls_to_transport(&TlsVerification::SystemDefaults),
            TlsMode::System
        ));
        assert!(matches!(
            tls_to_transport(&TlsVerification::DangerAcceptInvalid),
            TlsMode::DangerAcceptInvalid
        ));
    }

    #[test]
    fn bad_backend_url_is_a_config_error() {
        let config = CrmConfig {
            backend_url: "not a url".into(),
            ..CrmConfig::default()
        };
        assert!(matches!(Crm::new(config), Err(CoreError::Config { .. })));
    }
}
