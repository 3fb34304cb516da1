// ── Wire ↔ domain conversions ──
//
// `crm_api::ContactRecord` mirrors the backend JSON; `Contact` is what the
// cache and views hold. The shapes match today, but keeping the seam means
// the backend can grow fields without touching the domain type.

use crm_api::ContactRecord;

use crate::model::{Contact, ContactId};

impl From<ContactRecord> for Contact {
    fn from(r: ContactRecord) -> Self {
        Self {
            id: r.id.map(ContactId::new),
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            company: r.company,
            position: r.position,
            notes: r.notes,
        }
    }
}

impl From<&Contact> for ContactRecord {
    fn from(c: &Contact) -> Self {
        Self {
            id: c.id.map(ContactId::get),
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            company: c.company.clone(),
            position: c.position.clone(),
            notes: c.notes.clone(),
        }
    }
}
