// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Column metadata and the fixed `uidt` type enumeration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declared UI data type of a column (`uidt` on the wire).
///
/// Unknown tags are preserved in [`ColumnType::Other`] so they round-trip and
/// fall back to plain text editing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Single-line text.
    SingleLineText,
    /// Legacy plain text tag.
    Text,
    /// Long text.
    LongText,
    /// Multi-line text.
    MultiLineText,
    /// Integer number.
    Number,
    /// Decimal number.
    Decimal,
    /// Currency amount.
    Currency,
    /// Percentage.
    Percent,
    /// Boolean checkbox.
    Checkbox,
    /// Calendar date.
    Date,
    /// Date with time of day.
    DateTime,
    /// Time of day.
    Time,
    /// Email address.
    Email,
    /// URL.
    Url,
    /// Phone number.
    PhoneNumber,
    /// Single choice from a list.
    SingleSelect,
    /// Rating 0..=5.
    Rating,
    /// Duration in seconds.
    Duration,
    /// File attachment list.
    Attachment,
    /// Relation to rows of another table.
    LinkToAnotherRecord,
    /// Computed lookup through a relation.
    Lookup,
    /// Computed rollup through a relation.
    Rollup,
    /// Computed formula.
    Formula,
    /// Computed count.
    Count,
    /// Computed link counter.
    Links,
    /// Any tag this crate does not know about.
    Other(String),
}

impl ColumnType {
    /// Parse a `uidt` tag. Never fails; unknown tags become [`ColumnType::Other`].
    pub fn from_uidt(tag: &str) -> Self {
        match tag {
            "SingleLineText" => Self::SingleLineText,
            "Text" => Self::Text,
            "LongText" => Self::LongText,
            "MultiLineText" => Self::MultiLineText,
            "Number" => Self::Number,
            "Decimal" => Self::Decimal,
            "Currency" => Self::Currency,
            "Percent" => Self::Percent,
            "Checkbox" => Self::Checkbox,
            "Date" => Self::Date,
            "DateTime" => Self::DateTime,
            "Time" => Self::Time,
            "Email" => Self::Email,
            "URL" => Self::Url,
            "PhoneNumber" => Self::PhoneNumber,
            "SingleSelect" => Self::SingleSelect,
            "Rating" => Self::Rating,
            "Duration" => Self::Duration,
            "Attachment" => Self::Attachment,
            "LinkToAnotherRecord" => Self::LinkToAnotherRecord,
            "Lookup" => Self::Lookup,
            "Rollup" => Self::Rollup,
            "Formula" => Self::Formula,
            "Count" => Self::Count,
            "Links" => Self::Links,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire form of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SingleLineText => "SingleLineText",
            Self::Text => "Text",
            Self::LongText => "LongText",
            Self::MultiLineText => "MultiLineText",
            Self::Number => "Number",
            Self::Decimal => "Decimal",
            Self::Currency => "Currency",
            Self::Percent => "Percent",
            Self::Checkbox => "Checkbox",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Time => "Time",
            Self::Email => "Email",
            Self::Url => "URL",
            Self::PhoneNumber => "PhoneNumber",
            Self::SingleSelect => "SingleSelect",
            Self::Rating => "Rating",
            Self::Duration => "Duration",
            Self::Attachment => "Attachment",
            Self::LinkToAnotherRecord => "LinkToAnotherRecord",
            Self::Lookup => "Lookup",
            Self::Rollup => "Rollup",
            Self::Formula => "Formula",
            Self::Count => "Count",
            Self::Links => "Links",
            Self::Other(tag) => tag.as_str(),
        }
    }

    /// Computed types are displayed but never edited.
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            Self::Lookup | Self::Rollup | Self::Formula | Self::Count | Self::Links
        )
    }

    /// Number, decimal, currency, or percent.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number | Self::Decimal | Self::Currency | Self::Percent
        )
    }

    /// Numeric types edited with two-decimal precision.
    pub fn is_fractional(&self) -> bool {
        matches!(self, Self::Decimal | Self::Currency | Self::Percent)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_uidt(&tag))
    }
}

/// Relation options carried by link-to-record columns (`colOptions`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Id of the related table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk_related_model_id: Option<String>,
    /// Column of the related table used as display label, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk_label_column_id: Option<String>,
}

/// One field of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Unique column id.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Storage name. Null for computed and relational fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Declared type tag.
    pub uidt: ColumnType,
    /// Primary key.
    #[serde(default, deserialize_with = "flag")]
    pub pk: bool,
    /// Auto increment.
    #[serde(default, deserialize_with = "flag")]
    pub ai: bool,
    /// Required.
    #[serde(default, deserialize_with = "flag")]
    pub rqd: bool,
    /// Unique.
    #[serde(default, deserialize_with = "flag")]
    pub unique: bool,
    /// Base the column's table lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
    /// Column options; only the relation fields are modelled.
    #[serde(
        rename = "colOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub col_options: Option<RelationDescriptor>,
}

// Backends disagree on flag encoding: bool, 0/1, or null.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(serde_json::Value::String(s)) => s == "true" || s == "1",
        _ => false,
    })
}

impl Column {
    /// Column with the given id, title and type; every flag off.
    pub fn new(id: impl Into<String>, title: impl Into<String>, uidt: ColumnType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            column_name: None,
            uidt,
            pk: false,
            ai: false,
            rqd: false,
            unique: false,
            base_id: None,
            col_options: None,
        }
    }

    /// Set the storage name.
    pub fn with_column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }

    /// Mark as primary key with auto increment.
    pub fn primary_key(mut self) -> Self {
        self.pk = true;
        self.ai = true;
        self
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.rqd = true;
        self
    }

    /// Link this column to rows of `table_id`.
    pub fn links_to(mut self, table_id: impl Into<String>) -> Self {
        self.col_options = Some(RelationDescriptor {
            fk_related_model_id: Some(table_id.into()),
            fk_label_column_id: None,
        });
        self
    }

    /// Key used for this column in rows and forms: storage name, else title.
    pub fn key(&self) -> Option<&str> {
        match self.column_name.as_deref() {
            Some(name) if !name.is_empty() => Some(name),
            _ if !self.title.is_empty() => Some(&self.title),
            _ => None,
        }
    }

    /// Relation descriptor, only for link-to-record columns that name a related table.
    pub fn relation(&self) -> Option<&RelationDescriptor> {
        if self.uidt != ColumnType::LinkToAnotherRecord {
            return None;
        }
        self.col_options
            .as_ref()
            .filter(|r| r.fk_related_model_id.is_some())
    }

    /// True when the storage name or title equals `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.column_name.as_deref() == Some(name) || self.title == name
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn uidt_round_trips_known_and_unknown_tags() {
        for tag in ["URL", "LinkToAnotherRecord", "Decimal", "GeoData"] {
            assert_eq!(ColumnType::from_uidt(tag).as_str(), tag);
        }
        assert_eq!(
            ColumnType::from_uidt("GeoData"),
            ColumnType::Other("GeoData".into())
        );
    }

    #[test]
    fn deserializes_nocodb_column_payload() {
        let json = serde_json::json!({
            "id": "c1",
            "title": "Customer",
            "column_name": null,
            "uidt": "LinkToAnotherRecord",
            "pk": 0,
            "rqd": null,
            "ai": false,
            "base_id": "p1",
            "colOptions": { "fk_related_model_id": "t9", "type": "bt" }
        });
        let col: Column = serde_json::from_value(json).unwrap();
        assert_eq!(col.key(), Some("Customer"));
        assert!(!col.pk);
        assert!(!col.rqd);
        assert_eq!(
            col.relation().and_then(|r| r.fk_related_model_id.as_deref()),
            Some("t9")
        );
    }

    #[test]
    fn key_prefers_storage_name_and_rejects_blank() {
        let col = Column::new("c1", "Name", ColumnType::SingleLineText).with_column_name("name");
        assert_eq!(col.key(), Some("name"));

        let blank = Column::new("c2", "", ColumnType::SingleLineText).with_column_name("");
        assert_eq!(blank.key(), None);
    }

    #[test]
    fn relation_requires_link_type() {
        let col = Column::new("c1", "Tags", ColumnType::Lookup).links_to("t2");
        assert!(col.relation().is_none());
    }
}
