//! Ordered column/value map used for rows and write payloads.

use crate::model::record::{RecordError, RecordResult};
use rusqlite::types::Value;

/// Column-to-value map that keeps insertion order.
///
/// Order only affects generated SQL column order; lookups are by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentValues {
    entries: Vec<(String, Value)>,
}

impl ContentValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Sets `column`, replacing any previous value in place.
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// Builder-style `put`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(index).1)
    }

    /// Keeps only the listed columns.
    pub fn retain_columns(&mut self, columns: &[String]) {
        self.entries.retain(|(name, _)| columns.contains(name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get_i64(&self, column: &str) -> RecordResult<i64> {
        match self.require(column)? {
            Value::Integer(value) => Ok(*value),
            other => Err(mismatch(column, "integer", other)),
        }
    }

    pub fn opt_i64(&self, column: &str) -> RecordResult<Option<i64>> {
        self.optional(column, |value| match value {
            Value::Integer(value) => Ok(*value),
            other => Err(mismatch(column, "integer", other)),
        })
    }

    /// Reads a REAL column; INTEGER storage is widened.
    pub fn get_f64(&self, column: &str) -> RecordResult<f64> {
        real_value(column, self.require(column)?)
    }

    pub fn opt_f64(&self, column: &str) -> RecordResult<Option<f64>> {
        self.optional(column, |value| real_value(column, value))
    }

    pub fn get_text(&self, column: &str) -> RecordResult<String> {
        match self.require(column)? {
            Value::Text(value) => Ok(value.clone()),
            other => Err(mismatch(column, "text", other)),
        }
    }

    pub fn opt_text(&self, column: &str) -> RecordResult<Option<String>> {
        self.optional(column, |value| match value {
            Value::Text(value) => Ok(value.clone()),
            other => Err(mismatch(column, "text", other)),
        })
    }

    pub fn get_blob(&self, column: &str) -> RecordResult<Vec<u8>> {
        match self.require(column)? {
            Value::Blob(value) => Ok(value.clone()),
            other => Err(mismatch(column, "blob", other)),
        }
    }

    pub fn opt_blob(&self, column: &str) -> RecordResult<Option<Vec<u8>>> {
        self.optional(column, |value| match value {
            Value::Blob(value) => Ok(value.clone()),
            other => Err(mismatch(column, "blob", other)),
        })
    }

    /// Reads an INTEGER column as a flag; any non-zero value is `true`.
    pub fn get_bool(&self, column: &str) -> RecordResult<bool> {
        self.get_i64(column).map(|value| value != 0)
    }

    fn require(&self, column: &str) -> RecordResult<&Value> {
        self.get(column)
            .ok_or_else(|| RecordError::MissingColumn(column.to_string()))
    }

    fn optional<T>(
        &self,
        column: &str,
        read: impl FnOnce(&Value) -> RecordResult<T>,
    ) -> RecordResult<Option<T>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => read(value).map(Some),
        }
    }
}

impl IntoIterator for ContentValues {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ContentValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (column, value) in iter {
            values.put(column, value);
        }
        values
    }
}

fn real_value(column: &str, value: &Value) -> RecordResult<f64> {
    match value {
        Value::Real(value) => Ok(*value),
        Value::Integer(value) => Ok(*value as f64),
        other => Err(mismatch(column, "real", other)),
    }
}

fn mismatch(column: &str, expected: &'static str, found: &Value) -> RecordError {
    RecordError::TypeMismatch {
        column: column.to_string(),
        expected,
        found: value_kind(found),
    }
}

/// Storage class name of a SQLite value.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

#[cfg(test)]
mod tests {
    use super::ContentValues;
    use crate::model::record::RecordError;
    use rusqlite::types::Value;

    #[test]
    fn put_replaces_in_place_and_keeps_order() {
        let mut values = ContentValues::new();
        values.put("a", 1_i64).put("b", "x".to_string()).put("a", 2_i64);

        assert_eq!(values.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(values.get_i64("a").expect("a"), 2);
    }

    #[test]
    fn typed_getters_report_missing_and_mismatched_columns() {
        let values = ContentValues::new()
            .with("name", "Ada".to_string())
            .with("age", Value::Null);

        assert!(matches!(
            values.get_i64("missing"),
            Err(RecordError::MissingColumn(column)) if column == "missing"
        ));
        assert!(matches!(
            values.get_i64("name"),
            Err(RecordError::TypeMismatch { expected: "integer", found: "text", .. })
        ));
        assert_eq!(values.opt_i64("age").expect("null reads as none"), None);
        assert_eq!(values.opt_text("missing").expect("absent reads as none"), None);
    }

    #[test]
    fn real_getter_widens_integers() {
        let values = ContentValues::new().with("score", 7_i64);
        assert_eq!(values.get_f64("score").expect("score"), 7.0);
    }

    #[test]
    fn retain_columns_drops_unlisted_entries() {
        let mut values: ContentValues = vec![("a", 1_i64), ("b", 2_i64), ("c", 3_i64)]
            .into_iter()
            .collect();
        values.retain_columns(&["a".to_string(), "c".to_string()]);
        assert_eq!(values.columns().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
