// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Options for link-to-record pickers.

use serde_json::Value;
use tabula_model::{CellValue, Column, Row};
use tabula_store::RelatedRows;
use tracing::warn;

/// Inline message shown when related rows cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load related records";

/// Fields probed, in order, for a related row's label.
pub const LABEL_FIELDS: [&str; 5] = ["note", "name", "title", "Name", "Title"];

/// One choice in a relation picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationOption {
    /// Related row id as the picker value.
    pub id: String,
    /// Human label.
    pub label: String,
}

/// Loaded options, or the inline failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationOptions {
    /// Related rows resolved.
    Loaded(Vec<RelationOption>),
    /// Lookup failed; render the message next to the picker.
    Failed(String),
}

fn present(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Null | CellValue::Bool(false) => None,
        CellValue::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_form_string()).filter(|s| !s.is_empty()),
    }
}

// Rows are key-sorted maps, so "first value" is the value under the
// alphabetically first key, never the backend's field order.
fn row_id(row: &Row) -> Option<String> {
    ["id", "Id"]
        .iter()
        .find_map(|k| row.get(k).and_then(present))
        .or_else(|| row.iter().next().and_then(|(_, v)| present(v)))
}

impl RelationOptions {
    /// Fetch the related table's rows once for `column`.
    ///
    /// Never fails: a missing relation descriptor or a store error becomes
    /// [`RelationOptions::Failed`].
    pub async fn load<R>(store: &R, column: &Column) -> Self
    where
        R: RelatedRows + Sync,
    {
        let Some(table_id) = column.relation().and_then(|r| r.fk_related_model_id.as_deref()) else {
            warn!(column = %column.title, "link column has no related table");
            return Self::Failed(LOAD_FAILED.into());
        };
        match store.related_rows(table_id).await {
            Ok(rows) => Self::Loaded(Self::from_rows(&rows)),
            Err(err) => {
                warn!(?err, column = %column.title, "related rows unavailable");
                Self::Failed(LOAD_FAILED.into())
            }
        }
    }

    /// Derive `{id, label}` per row. Rows without any usable id are skipped.
    pub fn from_rows(rows: &[Row]) -> Vec<RelationOption> {
        rows.iter()
            .filter_map(|row| {
                let id = row_id(row)?;
                let label = LABEL_FIELDS
                    .iter()
                    .find_map(|k| row.get(k).and_then(present))
                    .unwrap_or_else(|| id.clone());
                Some(RelationOption { id, label })
            })
            .collect()
    }

    /// Options to show; empty on failure.
    pub fn options(&self) -> &[RelationOption] {
        match self {
            Self::Loaded(options) => options,
            Self::Failed(_) => &[],
        }
    }

    /// Inline error, if loading failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Loaded(_) => None,
            Self::Failed(message) => Some(message),
        }
    }

    /// Label for the selected id, falling back to the id itself.
    pub fn label_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.options()
            .iter()
            .find(|o| o.id == id)
            .map_or(id, |o| o.label.as_str())
    }
}

/// Picker value for a stored relation cell: the text itself, or for objects
/// the `id` property, else the property with the alphabetically first key.
pub fn value_id(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        CellValue::Json(Value::Object(map)) => map
            .get("id")
            .filter(|v| !v.is_null())
            .or_else(|| map.values().next())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_default(),
        other => other.to_form_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn labels_follow_probe_order() {
        let rows = [
            row(json!({"Id": 1, "name": "Ada", "note": "first"})),
            row(json!({"Id": 2, "Title": "Second"})),
            row(json!({"Id": 3, "name": ""})),
        ];
        let options = RelationOptions::from_rows(&rows);
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["first", "Second", "3"]);
        assert_eq!(options[0].id, "1");
    }

    #[test]
    fn id_falls_back_to_first_value() {
        let options = RelationOptions::from_rows(&[row(json!({"code": "X9", "name": "Widget"}))]);
        assert_eq!(options[0].id, "X9");
        assert_eq!(options[0].label, "Widget");
    }

    #[test]
    fn fallbacks_use_the_first_key_in_sorted_order() {
        let options = RelationOptions::from_rows(&[row(json!({"zone": "Z1", "code": "C7"}))]);
        assert_eq!(options[0].id, "C7");
        assert_eq!(value_id(&CellValue::from(json!({"zone": "Z1", "code": "C7"}))), "C7");
    }

    #[test]
    fn relation_object_selects_by_id() {
        assert_eq!(value_id(&CellValue::from(json!({"id": 4, "Title": "t"}))), "4");
        assert_eq!(value_id(&CellValue::from(json!({"Title": "t"}))), "t");
        assert_eq!(value_id(&CellValue::from("12")), "12");
        assert_eq!(value_id(&CellValue::Null), "");
    }

    #[test]
    fn failed_options_expose_message() {
        let failed = RelationOptions::Failed(LOAD_FAILED.into());
        assert!(failed.options().is_empty());
        assert_eq!(failed.error(), Some(LOAD_FAILED));
        assert_eq!(failed.label_for("7"), "7");
    }
}
