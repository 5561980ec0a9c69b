// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Column type to editable control.
//!
//! [`render`] is a pure function of the column and the field's current string
//! value. Each [`ColumnType`] variant has one arm. Unknown tags fall back to a
//! plain text input.

use tabula_model::{Column, ColumnType};
use tracing::warn;

use crate::attachment::AttachmentEditor;
use crate::datetime::{self, DateTimeValue};

/// `type` of a single-line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Plain text.
    Text,
    /// Email address.
    Email,
    /// URL.
    Url,
    /// Telephone number.
    Tel,
    /// `HH:mm` time of day.
    Time,
}

impl InputKind {
    /// HTML input type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Url => "url",
            Self::Tel => "tel",
            Self::Time => "time",
        }
    }
}

/// Step of a numeric input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStep {
    /// Whole numbers.
    Integer,
    /// Two decimal places.
    Hundredths,
}

impl NumberStep {
    /// Step attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "1",
            Self::Hundredths => "0.01",
        }
    }
}

/// The control to show for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldControl {
    /// Single-line input.
    TextInput {
        /// Input type.
        kind: InputKind,
        /// Current text.
        value: String,
    },
    /// Multi-line text.
    TextArea {
        /// Visible rows.
        rows: u8,
        /// Current text.
        value: String,
    },
    /// Checkbox with its own label (no separate field label).
    Checkbox {
        /// Checked state.
        checked: bool,
        /// Label shown next to the box.
        label: String,
    },
    /// Numeric input.
    NumberInput {
        /// Step.
        step: Option<NumberStep>,
        /// Lower bound.
        min: Option<u32>,
        /// Upper bound.
        max: Option<u32>,
        /// Current text.
        value: String,
    },
    /// Calendar picker for a `YYYY-MM-DD` value.
    DatePicker {
        /// Selected date.
        value: Option<chrono::NaiveDate>,
    },
    /// Calendar plus `HH:mm` time.
    DateTimePicker(DateTimeValue),
    /// Single-file attachment.
    Attachment(AttachmentEditor),
    /// Single choice among the related table's rows.
    Relation {
        /// Related table id, when the column declares one.
        related_table: Option<String>,
        /// Selected related row id.
        selected: String,
    },
}

/// A rendered field: control plus the chrome around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Form key (storage name, else title).
    pub key: String,
    /// Element id, `field-{key}`.
    pub id: String,
    /// Field label (the column title).
    pub label: String,
    /// Placeholder text.
    pub placeholder: String,
    /// Whether the field must be filled.
    pub required: bool,
    /// The control.
    pub control: FieldControl,
}

impl FieldSpec {
    /// Checkboxes carry their own label.
    pub fn shows_label(&self) -> bool {
        !matches!(self.control, FieldControl::Checkbox { .. })
    }
}

/// Checkbox truthiness of a form value.
pub fn is_checked(value: &str) -> bool {
    value == "true" || value == "1"
}

fn text(kind: InputKind, value: &str) -> FieldControl {
    FieldControl::TextInput {
        kind,
        value: value.to_string(),
    }
}

fn number(step: Option<NumberStep>, value: &str) -> FieldControl {
    FieldControl::NumberInput {
        step,
        min: None,
        max: None,
        value: value.to_string(),
    }
}

/// Control for `column` holding `value`.
///
/// Returns `None`, with a warning, when the column has neither a storage name
/// nor a title to key the field by.
pub fn render(column: &Column, value: &str) -> Option<FieldSpec> {
    let Some(key) = column.key() else {
        warn!(column_id = %column.id, "column has no name or title; field skipped");
        return None;
    };
    let title = &column.title;
    let mut placeholder = format!("Enter {title}");
    let select = format!("Select {title}");

    let control = match &column.uidt {
        ColumnType::LongText | ColumnType::MultiLineText => FieldControl::TextArea {
            rows: 4,
            value: value.to_string(),
        },
        ColumnType::Checkbox => FieldControl::Checkbox {
            checked: is_checked(value),
            label: title.clone(),
        },
        ColumnType::Date => {
            placeholder = select;
            FieldControl::DatePicker {
                value: datetime::parse_date(value),
            }
        }
        ColumnType::DateTime => {
            placeholder = select;
            FieldControl::DateTimePicker(DateTimeValue::parse(value))
        }
        ColumnType::Time => text(InputKind::Time, value),
        ColumnType::Number => number(Some(NumberStep::Integer), value),
        ColumnType::Decimal | ColumnType::Currency | ColumnType::Percent => {
            number(Some(NumberStep::Hundredths), value)
        }
        ColumnType::Email => text(InputKind::Email, value),
        ColumnType::Url => text(InputKind::Url, value),
        ColumnType::PhoneNumber => text(InputKind::Tel, value),
        ColumnType::SingleSelect => {
            placeholder = select;
            text(InputKind::Text, value)
        }
        ColumnType::Rating => FieldControl::NumberInput {
            step: Some(NumberStep::Integer),
            min: Some(0),
            max: Some(5),
            value: value.to_string(),
        },
        ColumnType::Duration => {
            placeholder = "Duration in seconds".into();
            number(None, value)
        }
        ColumnType::Attachment => FieldControl::Attachment(AttachmentEditor::from_value(value)),
        ColumnType::LinkToAnotherRecord => {
            placeholder = select;
            FieldControl::Relation {
                related_table: column
                    .relation()
                    .and_then(|r| r.fk_related_model_id.clone()),
                selected: value.to_string(),
            }
        }
        ColumnType::SingleLineText
        | ColumnType::Text
        | ColumnType::Lookup
        | ColumnType::Rollup
        | ColumnType::Formula
        | ColumnType::Count
        | ColumnType::Links
        | ColumnType::Other(_) => text(InputKind::Text, value),
    };

    Some(FieldSpec {
        key: key.to_string(),
        id: format!("field-{key}"),
        label: title.clone(),
        placeholder,
        required: column.rqd,
        control,
    })
}
