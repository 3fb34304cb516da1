// ── Contact record ──

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::{ValidationErrors, Validator};

pub const FIRST_NAME_FIELD: &str = "first_name";
pub const LAST_NAME_FIELD: &str = "last_name";
pub const EMAIL_FIELD: &str = "email";

const MIN_NAME_LEN: usize = 3;

// ── ContactId ───────────────────────────────────────────────────────

/// Backend-assigned contact identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(u64);

impl ContactId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContactId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

impl From<u64> for ContactId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ── Contact ─────────────────────────────────────────────────────────

/// A contact as the rest of the application sees it.
///
/// `id` is absent until the backend persists the record. Identity,
/// uniqueness, and storage all belong to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub position: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Contact {
    /// Start a new, unsaved contact from the three required fields.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: ContactId) -> Self {
        self.id = Some(id);
        self
    }

    /// "First Last", as list and detail views title a contact.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check the form constraints: both names at least three characters,
    /// email present and well formed. Every failing field is reported.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.min_len(FIRST_NAME_FIELD, &self.first_name, MIN_NAME_LEN)
            .min_len(LAST_NAME_FIELD, &self.last_name, MIN_NAME_LEN)
            .email(EMAIL_FIELD, &self.email);
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn contact_id_parses_plain_and_hash_prefixed() {
        assert_eq!("42".parse::<ContactId>().unwrap(), ContactId::new(42));
        assert_eq!("#7".parse::<ContactId>().unwrap(), ContactId::new(7));
        assert!("seven".parse::<ContactId>().is_err());
    }

    #[test]
    fn valid_contact_passes() {
        Contact::new("Ada", "Lovelace", "ada@example.com")
            .validate()
            .unwrap();
    }

    #[test]
    fn short_names_and_bad_email_all_reported() {
        let errors = Contact::new("Bo", "Xu", "not-an-email")
            .validate()
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.for_field(FIRST_NAME_FIELD).is_some());
        assert!(errors.for_field(LAST_NAME_FIELD).is_some());
        assert!(errors.for_field(EMAIL_FIELD).is_some());
    }

    #[test]
    fn empty_fields_are_required() {
        let errors = Contact::default().validate().unwrap_err();
        let first = errors.for_field(FIRST_NAME_FIELD).unwrap();
        assert_eq!(first.message, "is a required field");
    }

    #[test]
    fn extra_fields_do_not_affect_validation() {
        let mut c = Contact::new("Grace", "Hopper", "grace@navy.mil");
        c.notes = "x".into();
        c.validate().unwrap();
    }

    #[test]
    fn serializes_without_id_or_empty_extras() {
        let json = serde_json::to_value(Contact::new("Bo", "Xu", "bo@example.com")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "first_name": "Bo",
                "last_name": "Xu",
                "email": "bo@example.com"
            })
        );
    }

    #[test]
    fn deserializes_backend_shape() {
        let c: Contact = serde_json::from_value(serde_json::json!({
            "id": 42,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "phone": "",
            "company": "",
            "position": "",
            "notes": ""
        }))
        .unwrap();
        assert_eq!(c.id, Some(ContactId::new(42)));
        assert_eq!(c.full_name(), "Ada Lovelace");
    }
}
