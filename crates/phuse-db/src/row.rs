//! Result rows returned by the driver.

use serde::Serialize;
use serde_json::{Map, json};

use crate::value::Value;

/// One fetched row: ordered column/value pairs.
///
/// Column order follows the statement's projection. Lookup by name takes the
/// first match, so duplicate column labels behave like the driver's
/// associative fetch mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column to the row, preserving order.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Value of the first column with this name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value at a projection position.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The row as a JSON object (the object-shaped fetch mode).
    ///
    /// Later duplicates of a column label overwrite earlier ones, as object
    /// keys must be unique.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = Map::with_capacity(self.columns.len());
        for (name, value) in &self.columns {
            map.insert(name.clone(), json!(value));
        }
        serde_json::Value::Object(map)
    }
}

impl<S, V> FromIterator<(S, V)> for Row
where
    S: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
