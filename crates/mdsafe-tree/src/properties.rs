//! Element attribute storage.

use std::fmt;

/// Attribute value.
///
/// Space-separated attributes such as `class` are kept as token lists so
/// stages can add or test individual tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    /// Plain string value (may be empty for boolean attributes).
    String(String),
    /// Space-separated token list.
    List(Vec<String>),
}

impl PropertyValue {
    /// Whether the value carries no content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(value) => value.is_empty(),
            Self::List(tokens) => tokens.iter().all(String::is_empty),
        }
    }

    /// Get the value as a single string slice, if it is not a token list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Tokens of the value (a plain string is split on ASCII whitespace).
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Self::String(value) => value.split_ascii_whitespace().collect(),
            Self::List(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::List(tokens) => f.write_str(&tokens.join(" ")),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(tokens: Vec<String>) -> Self {
        Self::List(tokens)
    }
}

/// Attribute map with unique keys.
///
/// Keys keep their insertion order so serialized markup is stable, but no stage
/// relies on that order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an attribute value.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    /// Look up a mutable attribute value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether an attribute is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set an attribute, replacing any previous value under the same key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(existing) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove an attribute and return its value.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Keep only attributes for which the predicate returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &PropertyValue) -> bool) {
        self.entries.retain(|(key, value)| keep(key, value));
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterate mutably over `(name, value)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PropertyValue)> {
        self.entries
            .iter_mut()
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}
