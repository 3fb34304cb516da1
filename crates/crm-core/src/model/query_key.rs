// ── Query keys ──
//
// A key is an ordered list of primitive segments compared structurally:
// `["contact", "42"]` built twice is the same key.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ContactId;

const CONTACTS: &str = "contacts";
const CONTACT: &str = "contact";

/// One primitive component of a `QueryKey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Int(i64),
    Str(String),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for KeySegment {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for KeySegment {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for KeySegment {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Names one cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new<S: Into<KeySegment>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `["contacts"]`: the full contact list.
    pub fn contacts() -> Self {
        Self::new([CONTACTS])
    }

    /// `["contact", "<id>"]`: one contact's detail view. The id is a string
    /// segment, matching how route parameters arrive.
    pub fn contact(id: ContactId) -> Self {
        Self::new([CONTACT.to_owned(), id.to_string()])
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// `true` if `prefix`'s segments are a leading run of this key's.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{seg}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn structurally_equal_keys_are_equal() {
        let a = QueryKey::contact(ContactId::new(42));
        let b = QueryKey::new(["contact", "42"]);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn segment_types_are_significant() {
        let text = QueryKey::new([KeySegment::from("contact"), KeySegment::from("42")]);
        let int = QueryKey::new([KeySegment::from("contact"), KeySegment::from(42)]);
        assert_ne!(text, int);
    }

    #[test]
    fn display_looks_like_json() {
        assert_eq!(QueryKey::contacts().to_string(), r#"["contacts"]"#);
        assert_eq!(
            QueryKey::contact(ContactId::new(7)).to_string(),
            r#"["contact","7"]"#
        );
        let mixed = QueryKey::new([KeySegment::from("page"), KeySegment::from(2)]);
        assert_eq!(mixed.to_string(), r#"["page",2]"#);
    }

    #[test]
    fn prefix_matching() {
        let detail = QueryKey::contact(ContactId::new(1));
        assert!(detail.starts_with(&QueryKey::new(["contact"])));
        assert!(!detail.starts_with(&QueryKey::contacts()));
    }
}
