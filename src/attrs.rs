//! Key/value annotations and the ordered sets they travel in.
//!
//! Every Dia value except references and attributes themselves carries an
//! [`AttrSet`]. Order is preserved on the wire, so [`AttrSet`] is a thin
//! wrapper around a vector of [`Attr`]s that de-duplicates by key on
//! insertion instead of sorting.
//!
//! # Example
//!
//! ```
//! use bion::prelude::*;
//!
//! let mut attrs = AttrSet::new();
//! attrs.insert(Attr::flag("hidden"));
//! attrs.insert(Attr::new("lang", "en"));
//!
//! // inserting an existing key replaces the value in place
//! attrs.insert(Attr::new("hidden", "deeply"));
//!
//! assert_eq!(attrs.len(), 2);
//! assert_eq!(attrs.get("hidden").unwrap().value(), Some("deeply"));
//! ```

use std::{iter::FromIterator, slice::Iter};

/// A single annotation: an identifier key with an optional string value.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
pub struct Attr {
    key: String,
    value: Option<String>,
}

impl Attr {
    /// Creates an attribute with a value.
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Attr {
        Attr {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a value-less attribute.
    pub fn flag<K: Into<String>>(key: K) -> Attr {
        Attr {
            key: key.into(),
            value: None,
        }
    }

    /// The attribute key.
    pub fn key(&self) -> &str { &self.key }

    /// The attribute value, if one was set.
    pub fn value(&self) -> Option<&str> { self.value.as_ref().map(String::as_str) }

    /// Consumes the attribute, returning its parts.
    pub fn into_parts(self) -> (String, Option<String>) { (self.key, self.value) }
}

/// An ordered, key-de-duplicated collection of [`Attr`]s.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug, Default)]
pub struct AttrSet(Vec<Attr>);

impl AttrSet {
    /// Creates an empty set.
    pub fn new() -> AttrSet { AttrSet(Vec::new()) }

    /// Number of attributes in the set.
    pub fn len(&self) -> usize { self.0.len() }

    /// Indicates whether the set is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Inserts an attribute. If the key is already present the existing
    /// entry is replaced in place, keeping its position.
    pub fn insert(&mut self, attr: Attr) {
        match self.0.iter_mut().find(|a| a.key == attr.key) {
            Some(slot) => *slot = attr,
            None => self.0.push(attr),
        }
    }

    /// Looks up an attribute by key.
    pub fn get(&self, key: &str) -> Option<&Attr> { self.0.iter().find(|a| a.key == key) }

    /// Iterates over the attributes in insertion order.
    pub fn iter(&self) -> Iter<Attr> { self.0.iter() }
}

impl From<Vec<Attr>> for AttrSet {
    fn from(v: Vec<Attr>) -> AttrSet {
        let mut set = AttrSet::new();
        for attr in v {
            set.insert(attr);
        }
        set
    }
}

impl FromIterator<Attr> for AttrSet {
    fn from_iter<I: IntoIterator<Item = Attr>>(iter: I) -> AttrSet {
        let mut set = AttrSet::new();
        for attr in iter {
            set.insert(attr);
        }
        set
    }
}

impl IntoIterator for AttrSet {
    type IntoIter = std::vec::IntoIter<Attr>;
    type Item = Attr;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a AttrSet {
    type IntoIter = Iter<'a, Attr>;
    type Item = &'a Attr;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut set = AttrSet::new();
        set.insert(Attr::new("a", "1"));
        set.insert(Attr::flag("b"));
        set.insert(Attr::new("a", "2"));

        assert_eq!(set.len(), 2);

        let keys: Vec<&str> = set.iter().map(Attr::key).collect();
        assert_eq!(keys, vec!["a", "b"]);

        assert_eq!(set.get("a").unwrap().value(), Some("2"));
        assert_eq!(set.get("b").unwrap().value(), None);
    }

    #[test]
    fn from_vec_dedups() {
        let set = AttrSet::from(vec![
            Attr::flag("x"),
            Attr::new("y", "1"),
            Attr::new("x", "later"),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("x").unwrap().value(), Some("later"));
    }
}
