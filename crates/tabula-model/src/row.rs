// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Row bags, cell values, and row identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Column;

/// Closed set of values a row cell can hold.
///
/// Objects and arrays (attachment lists, relation objects) stay as raw JSON in
/// [`CellValue::Json`]; dates travel as [`CellValue::Text`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum CellValue {
    /// Null or absent.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number, kept in its JSON representation so integers stay integers.
    Number(serde_json::Number),
    /// String, including date and time strings.
    Text(String),
    /// Object or array.
    Json(Value),
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => Self::Json(other),
        }
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Null => Self::Null,
            CellValue::Bool(b) => Self::Bool(b),
            CellValue::Number(n) => Self::Number(n),
            CellValue::Text(s) => Self::String(s),
            CellValue::Json(v) => v,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl CellValue {
    /// True for null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String form used to seed editable controls. Null becomes empty,
    /// objects and arrays become compact JSON.
    pub fn to_form_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Borrow the text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One row: column key (storage name, else title) to cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, CellValue>);

impl Row {
    /// Empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.get(key)
    }

    /// Cell for `key` unless absent or null.
    pub fn get_non_null(&self, key: &str) -> Option<&CellValue> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Insert or replace a cell.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Option<CellValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a cell.
    pub fn remove(&mut self, key: &str) -> Option<CellValue> {
        self.0.remove(key)
    }

    /// Iterate cells in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.0.iter()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cells as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Row {
    type Item = (String, CellValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, CellValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Identifier of a row as the backend accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    /// Integer id (auto-increment keys).
    Int(i64),
    /// Any other id.
    Text(String),
}

impl RowId {
    /// Derive an id from a cell. Null, booleans, objects and arrays yield `None`.
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::Text(n.to_string()), Self::Int),
            ),
            CellValue::Text(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// JSON form of the id.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Resolve the identity of `row`.
///
/// Probe order: the primary-key column's storage name, then its title, then
/// the conventional `id` and `Id` keys. Null cells are skipped.
pub fn row_identity(columns: &[Column], row: &Row) -> Option<RowId> {
    let pk = columns.iter().find(|c| c.pk);
    let pk_keys = pk
        .into_iter()
        .flat_map(|c| [c.column_name.as_deref(), Some(c.title.as_str())])
        .flatten();
    pk_keys
        .chain(["id", "Id"])
        .find_map(|key| row.get_non_null(key))
        .and_then(RowId::from_cell)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::ColumnType;

    #[test]
    fn cell_value_keeps_json_shape() {
        let raw = serde_json::json!({
            "Id": 7,
            "price": 1.5,
            "done": true,
            "note": null,
            "files": [{"title": "a.png"}]
        });
        let row: Row = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(row.get("Id"), Some(&CellValue::from(7_i64)));
        assert!(matches!(row.get("files"), Some(CellValue::Json(_))));
        assert_eq!(row.to_json(), raw);
    }

    #[test]
    fn integers_beyond_f64_precision_stay_exact() {
        let raw = serde_json::json!({ "Id": 9_007_199_254_740_993_i64, "ratio": 0.25 });
        let row: Row = serde_json::from_value(raw.clone()).unwrap();
        let id = row.get("Id").and_then(RowId::from_cell);
        assert_eq!(id, Some(RowId::Int(9_007_199_254_740_993)));
        assert_eq!(row.to_json(), raw);
    }

    #[test]
    fn identity_prefers_primary_key_column() {
        let columns = vec![
            Column::new("c0", "Code", ColumnType::SingleLineText)
                .with_column_name("code")
                .primary_key(),
            Column::new("c1", "Name", ColumnType::SingleLineText),
        ];
        let row: Row = [("code", CellValue::from("A-1")), ("Id", CellValue::from(3_i64))]
            .into_iter()
            .collect();
        assert_eq!(row_identity(&columns, &row), Some(RowId::Text("A-1".into())));
    }

    #[test]
    fn identity_falls_back_to_title_then_conventional_keys() {
        let columns = vec![Column::new("c0", "Id", ColumnType::Number).primary_key()];
        let row: Row = [("Id", 12_i64)].into_iter().collect();
        assert_eq!(row_identity(&columns, &row), Some(RowId::Int(12)));

        let row: Row = [("id", CellValue::Null), ("Id", CellValue::from(4_i64))]
            .into_iter()
            .collect();
        assert_eq!(row_identity(&[], &row), Some(RowId::Int(4)));
        assert_eq!(row_identity(&[], &Row::new()), None);
    }

    #[test]
    fn row_id_serializes_untagged() {
        assert_eq!(serde_json::to_value(RowId::Int(5)).unwrap(), serde_json::json!(5));
        let id: RowId = serde_json::from_value(serde_json::json!("rec_1")).unwrap();
        assert_eq!(id, RowId::Text("rec_1".into()));
    }
}
