// ── Field-level validation ──
//
// A small rule builder: each rule checks one field and records at most one
// message for it, so a form can show every problem at once instead of
// failing on the first.

use std::fmt;

use serde::Serialize;

/// One failing field and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Every field that failed validation, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The error recorded for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field errors; `finish` turns them into a `Result`.
///
/// A field that already failed is not checked again, so chaining several
/// rules on one field reports only the first problem.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field must be non-empty.
    pub fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.push(field, "is a required field".into());
        }
        self
    }

    /// Field must be non-empty and at least `min` characters long.
    pub fn min_len(&mut self, field: &'static str, value: &str, min: usize) -> &mut Self {
        self.required(field, value);
        if !self.has_error(field) && value.chars().count() < min {
            self.push(field, format!("must be at least {min} characters"));
        }
        self
    }

    /// Field must be non-empty and look like an email address.
    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.required(field, value);
        if !self.has_error(field) && !is_valid_email(value) {
            self.push(field, "must be a valid email".into());
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }

    fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: &'static str, message: String) {
        if !self.has_error(field) {
            self.errors.push(FieldError { field, message });
        }
    }
}

/// `local@domain.tld`: one `@`, no whitespace, a dotted domain whose labels
/// are non-empty alphanumerics or inner hyphens.
fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for addr in [
            "ada@example.com",
            "first.last@sub.example.org",
            "x+tag@mail.co",
            "o'neil@example.ie",
        ] {
            assert!(is_valid_email(addr), "{addr} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for addr in [
            "plain",
            "@example.com",
            "ada@",
            "ada@localhost",
            "ada@@example.com",
            "ada@exa mple.com",
            "ada@example..com",
            "ada@-example.com",
            ".ada@example.com",
        ] {
            assert!(!is_valid_email(addr), "{addr} should be invalid");
        }
    }

    #[test]
    fn min_len_counts_characters_not_bytes() {
        let mut v = Validator::new();
        v.min_len("name", "Zoë", 3);
        v.finish().unwrap();
    }

    #[test]
    fn one_message_per_field() {
        let mut v = Validator::new();
        v.required("email", "").email("email", "");
        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.to_string(), "email is a required field");
    }

    #[test]
    fn display_joins_fields_in_rule_order() {
        let mut v = Validator::new();
        v.min_len("first_name", "Bo", 3).email("email", "nope");
        let errors = v.finish().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "first_name must be at least 3 characters, email must be a valid email"
        );
    }
}
