//! The header of an entity: an insertion-ordered sequence of fields.

use crate::field::Field;
use std::fmt;

/// An ordered collection of header fields.
///
/// Duplicate names are permitted and arrival order is preserved, as
/// required for trace headers. Lookup by name ignores case and returns the
/// first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    fields: Vec<Field>,
}

impl Header {
    /// Creates a new empty header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping any existing fields of the same name.
    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Sets a field: replaces the first field of the same name in place,
    /// removes any later duplicates, and appends when the name is absent.
    pub fn set(&mut self, field: Field) {
        let Some(first) = self.fields.iter().position(|f| f.is_named(field.name())) else {
            self.fields.push(field);
            return;
        };

        let name = field.name().to_string();
        self.fields[first] = field;
        let mut index = 0;
        self.fields.retain(|f| {
            let keep = index <= first || !f.is_named(&name);
            index += 1;
            keep
        });
    }

    /// Returns the first field with the given name, ignoring case.
    ///
    /// Absence is a normal outcome, never an error.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_named(name))
    }

    /// Returns every field with the given name in stored order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.is_named(name)).collect()
    }

    /// Removes every field with the given name and returns how many were
    /// removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| !f.is_named(name));
        before - self.fields.len()
    }

    /// Iterates over the fields in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the header holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn field(name: &str, value: &str) -> Field {
        Field::new(name, value).unwrap()
    }

    #[test]
    fn test_get_first_match_case_insensitive() {
        let mut header = Header::new();
        header.add(field("Received", "first"));
        header.add(field("received", "second"));

        assert_eq!(header.get("RECEIVED").unwrap().raw_value(), "first");
        assert_eq!(header.get_all("received").len(), 2);
    }

    #[test]
    fn test_get_absent_is_none() {
        let header = Header::new();
        assert!(header.get("Subject").is_none());
        assert!(header.get_all("Subject").is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let mut header = Header::new();
        header.add(field("A", "1"));
        header.add(field("B", "2"));
        header.add(field("A", "3"));

        let names: Vec<_> = header.iter().map(Field::name).collect();
        assert_eq!(names, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut header = Header::new();
        header.add(field("A", "1"));
        header.add(field("Subject", "old"));
        header.add(field("B", "2"));
        header.add(field("subject", "older"));

        header.set(field("Subject", "new"));

        let names: Vec<_> = header.iter().map(Field::name).collect();
        assert_eq!(names, vec!["A", "Subject", "B"]);
        assert_eq!(header.get("Subject").unwrap().raw_value(), "new");
    }

    #[test]
    fn test_set_appends_when_absent() {
        let mut header = Header::new();
        header.set(field("Subject", "hi"));
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn test_remove_all_matches() {
        let mut header = Header::new();
        header.add(field("Received", "a"));
        header.add(field("Subject", "hi"));
        header.add(field("received", "b"));

        assert_eq!(header.remove("Received"), 2);
        assert_eq!(header.len(), 1);
        assert_eq!(header.remove("Received"), 0);
    }

    #[test]
    fn test_display() {
        let mut header = Header::new();
        header.add(field("From", "a@example.com"));
        header.add(field("Subject", "Hi"));

        assert_eq!(header.to_string(), "From: a@example.com\nSubject: Hi\n");
    }
}
