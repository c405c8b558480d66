//! Named-placeholder bind registry with monotonic allocation.

use crate::value::Value;

/// The bind registry of one builder: ordered `(name, value)` pairs.
///
/// Placeholder names are allocated here. Each allocation derives the name
/// from the column (dots become underscores) and appends a counter that only
/// ever moves forward within one builder lifetime, so binding the same
/// column or the same value twice can never clobber an earlier entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
    next: u32,
}

impl Bindings {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a placeholder for `column`, record the value, and return the
    /// placeholder name (without the leading colon).
    pub(crate) fn bind(&mut self, column: &str, value: Value) -> String {
        self.next += 1;
        let mut name = String::with_capacity(column.len() + 4);
        for ch in column.chars() {
            name.push(if ch == '.' { '_' } else { ch });
        }
        name.push_str(&self.next.to_string());
        self.entries.push((name.clone(), value));
        name
    }

    /// Record a value under an explicit name, replacing any entry already
    /// held under that name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Value bound under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Iterate entries in bind order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Placeholder names in bind order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Get the current entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another registry's entries into this one, name by name.
    pub fn merge(&mut self, other: Bindings) {
        for (name, value) in other.entries {
            self.set(name, value);
        }
    }

    /// Clear all entries and rewind the allocator.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next = 0;
    }
}
