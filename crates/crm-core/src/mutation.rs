// ── Mutation coordinator ──
//
// Runs one write against the backend: create when the payload has no id,
// update when it does. Follow-up work (seeding the detail cache, refreshing
// the list, validating a form beforehand) is the caller's to compose.

use std::sync::Arc;

use crm_api::{ContactRecord, ContactsClient};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Contact, ContactId};

// ── MutationRequest ─────────────────────────────────────────────────

/// A contact payload headed for the backend. `id` selects update over
/// create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    contact: Contact,
}

impl MutationRequest {
    pub fn new(contact: Contact) -> Self {
        Self { contact }
    }

    /// Create request; any id on `contact` is dropped.
    pub fn create(mut contact: Contact) -> Self {
        contact.id = None;
        Self { contact }
    }

    /// Update request for `id`, whatever id `contact` carried.
    pub fn update(id: ContactId, contact: Contact) -> Self {
        Self {
            contact: contact.with_id(id),
        }
    }

    pub fn id(&self) -> Option<ContactId> {
        self.contact.id
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn into_contact(self) -> Contact {
        self.contact
    }
}

impl From<Contact> for MutationRequest {
    fn from(contact: Contact) -> Self {
        Self::new(contact)
    }
}

// ── MutationState ───────────────────────────────────────────────────

/// `Idle -> Pending -> Success | Error`; the next `mutate` starts over at
/// `Pending`.
#[derive(Debug, Clone, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Success(Arc<Contact>),
    Error(Arc<CoreError>),
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

// ── ContactMutation ─────────────────────────────────────────────────

/// Executes contact writes and publishes their progress.
///
/// No retries, no rollback, and no cache invalidation happen here.
pub struct ContactMutation {
    client: Arc<ContactsClient>,
    state: watch::Sender<MutationState>,
}

impl ContactMutation {
    pub fn new(client: Arc<ContactsClient>) -> Self {
        let (state, _) = watch::channel(MutationState::Idle);
        Self { client, state }
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    pub fn reset(&self) {
        self.state.send_replace(MutationState::Idle);
    }

    /// Create or update `request` on the backend.
    ///
    /// The payload is sent as given; form checks ([`Contact::validate`]) are
    /// the caller's.
    pub async fn mutate(&self, request: MutationRequest) -> Result<Contact, CoreError> {
        self.state.send_replace(MutationState::Pending);

        match self.execute(request).await {
            Ok(contact) => {
                self.state
                    .send_replace(MutationState::Success(Arc::new(contact.clone())));
                Ok(contact)
            }
            Err(err) => {
                warn!(error = %err, "mutation failed");
                self.state
                    .send_replace(MutationState::Error(Arc::new(err.clone())));
                Err(err)
            }
        }
    }

    async fn execute(&self, request: MutationRequest) -> Result<Contact, CoreError> {
        let record = ContactRecord::from(request.contact());
        let saved = match request.id() {
            Some(id) => {
                debug!(%id, "updating contact");
                self.client.update(id.get(), &record).await?
            }
            None => {
                debug!("creating contact");
                self.client.create(&record).await?
            }
        };

        let contact = Contact::from(saved);
        if let Some(id) = contact.id {
            info!(%id, name = %contact.full_name(), "contact saved");
        }
        Ok(contact)
    }
}
