// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Create/edit form built from a column set.
//!
//! Only editable columns get fields: primary keys, auto-increment columns,
//! system columns and computed columns are left out, while link-to-record
//! columns stay in. Field state is kept as strings, the way the controls edit
//! it, and converted to typed cells once on submit.

use std::collections::BTreeMap;
use std::future::Future;

use serde_json::Value;
use tabula_model::{CellValue, Column, ColumnType, Row};
use thiserror::Error;

use crate::field::{self, FieldSpec};
use crate::relation;

/// Columns never offered for editing, matched on storage name or title.
pub const SYSTEM_COLUMNS: [&str; 4] = ["nc_created_by", "nc_updated_by", "CreatedAt", "UpdatedAt"];

/// Keys removed from edit payloads even when present in form state.
pub const EDIT_STRIPPED_KEYS: [&str; 4] = ["id", "Id", "CreatedAt", "UpdatedAt"];

/// Create a new row or edit an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// New row.
    Create,
    /// Existing row.
    Edit,
}

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Form key.
    pub field: String,
    /// Message, e.g. `Name is required`.
    pub message: String,
}

/// Form submission rejected before any mutation ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// One or more fields failed validation.
    #[error("{}", summarize(.0))]
    Invalid(Vec<ValidationError>),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether `column` gets a field in the form.
pub fn is_editable(column: &Column) -> bool {
    if column.pk || column.ai {
        return false;
    }
    if SYSTEM_COLUMNS.iter().any(|name| column.is_named(name)) {
        return false;
    }
    !column.uidt.is_computed()
}

/// The editable subset of `columns`, in order.
pub fn editable_columns(columns: &[Column]) -> Vec<Column> {
    columns.iter().filter(|c| is_editable(c)).cloned().collect()
}

fn seed(columns: &[Column], row: Option<&Row>) -> BTreeMap<String, String> {
    let Some(row) = row else {
        return BTreeMap::new();
    };
    let mut values: BTreeMap<String, String> = row
        .iter()
        .map(|(k, v)| (k.clone(), v.to_form_string()))
        .collect();
    // Relation cells may arrive as objects; the picker wants the id.
    for column in columns {
        if column.uidt == ColumnType::LinkToAnotherRecord {
            if let Some((key, cell)) = column.key().and_then(|k| row.get(k).map(|c| (k, c))) {
                values.insert(key.to_string(), relation::value_id(cell));
            }
        }
    }
    values
}

/// Convert one field's string value to a typed cell.
pub fn to_cell(column: &Column, raw: &str) -> CellValue {
    match &column.uidt {
        ColumnType::Checkbox => CellValue::Bool(field::is_checked(raw)),
        _ if raw.is_empty() => CellValue::Null,
        ColumnType::Rating | ColumnType::Duration | ColumnType::LinkToAnotherRecord => {
            number(raw.trim()).unwrap_or_else(|| CellValue::Text(raw.to_string()))
        }
        uidt if uidt.is_numeric() => {
            number(raw.trim()).unwrap_or_else(|| CellValue::Text(raw.to_string()))
        }
        ColumnType::Attachment => serde_json::from_str::<Value>(raw)
            .map_or_else(|_| CellValue::Text(raw.to_string()), CellValue::from),
        _ => CellValue::Text(raw.to_string()),
    }
}

fn number(raw: &str) -> Option<CellValue> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(CellValue::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(CellValue::Number)
}

/// A create or edit form over one table's editable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicForm {
    mode: FormMode,
    columns: Vec<Column>,
    initial: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
    errors: Vec<ValidationError>,
    open: bool,
}

impl DynamicForm {
    /// Open form for `columns`. In edit mode the state is seeded from `row`.
    pub fn new(columns: &[Column], mode: FormMode, row: Option<&Row>) -> Self {
        let initial = seed(columns, row);
        Self {
            mode,
            columns: editable_columns(columns),
            values: initial.clone(),
            initial,
            errors: Vec::new(),
            open: true,
        }
    }

    /// Empty create form.
    pub fn create(columns: &[Column]) -> Self {
        Self::new(columns, FormMode::Create, None)
    }

    /// Edit form seeded from `row`.
    pub fn edit(columns: &[Column], row: &Row) -> Self {
        Self::new(columns, FormMode::Edit, Some(row))
    }

    /// Form mode.
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Whether the dialog is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Dialog title.
    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Create New Record",
            FormMode::Edit => "Edit Record",
        }
    }

    /// Dialog description.
    pub fn description(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Fill in the form below to create a new record.",
            FormMode::Edit => "Update the fields below to edit this record.",
        }
    }

    /// Submit button label.
    pub fn submit_label(&self, submitting: bool) -> &'static str {
        match (submitting, self.mode) {
            (true, _) => "Saving...",
            (false, FormMode::Create) => "Create",
            (false, FormMode::Edit) => "Update",
        }
    }

    /// Columns that have fields.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rendered fields in column order. Columns without a key are skipped.
    pub fn fields(&self) -> Vec<FieldSpec> {
        self.columns
            .iter()
            .filter_map(|c| {
                let value = c.key().map_or("", |k| self.value(k));
                field::render(c, value)
            })
            .collect()
    }

    /// Current string value of `key`.
    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }

    /// Set a field from its control.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.errors.retain(|e| e.field != key);
        self.values.insert(key, value.into());
    }

    /// Errors from the last failed submit.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Validation message for `key`, if any.
    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == key)
            .map(|e| e.message.as_str())
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), FormError> {
        let errors: Vec<ValidationError> = self
            .columns
            .iter()
            .filter(|c| c.rqd)
            .filter_map(|c| {
                let key = c.key()?;
                self.value(key).is_empty().then(|| ValidationError {
                    field: key.to_string(),
                    message: format!("{} is required", c.title),
                })
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormError::Invalid(errors))
        }
    }

    /// Typed payload for the mutation. Edit payloads never carry identity or
    /// timestamp keys.
    pub fn payload(&self) -> Row {
        let mut row: Row = self
            .columns
            .iter()
            .filter_map(|c| {
                let key = c.key()?;
                let raw = self.values.get(key)?;
                Some((key.to_string(), to_cell(c, raw)))
            })
            .collect();
        if self.mode == FormMode::Edit {
            for key in EDIT_STRIPPED_KEYS {
                row.remove(key);
            }
        }
        row
    }

    /// Restore the values the form opened with.
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
    }

    /// Reset and close without submitting.
    pub fn cancel(&mut self) {
        self.reset();
        self.open = false;
    }

    /// Validate, then hand the payload to `mutate`.
    ///
    /// On a validation failure `mutate` is not called and the form stays
    /// open with its errors. Otherwise the form is reset and closed once
    /// `mutate` finishes, whatever it returned; the outcome is passed back
    /// for the caller to report.
    pub async fn submit<F, Fut, T>(&mut self, mutate: F) -> Result<T, FormError>
    where
        F: FnOnce(Row) -> Fut,
        Fut: Future<Output = T>,
    {
        if let Err(err) = self.validate() {
            let FormError::Invalid(errors) = &err;
            self.errors.clone_from(errors);
            return Err(err);
        }
        let outcome = mutate(self.payload()).await;
        self.reset();
        self.open = false;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("c0", "Id", ColumnType::Number)
                .with_column_name("Id")
                .primary_key(),
            Column::new("c1", "Name", ColumnType::SingleLineText)
                .with_column_name("name")
                .required(),
            Column::new("c2", "Qty", ColumnType::Number).with_column_name("qty"),
            Column::new("c3", "Done", ColumnType::Checkbox).with_column_name("done"),
            Column::new("c4", "CreatedAt", ColumnType::DateTime).with_column_name("created_at"),
            Column::new("c5", "Total", ColumnType::Formula),
            Column::new("c6", "Owner", ColumnType::LinkToAnotherRecord).links_to("t9"),
            Column::new("c7", "Creator", ColumnType::SingleLineText).with_column_name("nc_created_by"),
        ]
    }

    #[test]
    fn only_editable_columns_get_fields() {
        let form = DynamicForm::create(&columns());
        let keys: Vec<_> = form.fields().into_iter().map(|f| f.key).collect();
        assert_eq!(keys, ["name", "qty", "done", "Owner"]);
    }

    #[test]
    fn reset_restores_a_fresh_form() {
        let fresh = DynamicForm::create(&columns());
        let mut form = fresh.clone();
        form.set("name", "Draft");
        assert_ne!(form, fresh);
        form.reset();
        assert_eq!(form, fresh);
    }

    #[tokio::test]
    async fn required_fields_block_the_mutation() {
        let mut form = DynamicForm::create(&columns());
        let mut called = false;
        let result = form
            .submit(|_| {
                called = true;
                async {}
            })
            .await;
        assert_eq!(
            result,
            Err(FormError::Invalid(vec![ValidationError {
                field: "name".into(),
                message: "Name is required".into()
            }]))
        );
        assert!(!called);
        assert!(form.is_open());
        assert_eq!(form.error_for("name"), Some("Name is required"));
        form.set("name", "X");
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn submit_closes_even_when_the_mutation_fails() {
        let mut form = DynamicForm::create(&columns());
        form.set("name", "Widget");
        form.set("qty", "3");
        form.set("done", "true");
        let result: Result<Result<(), &str>, _> = form.submit(|_| async { Err("backend down") }).await;
        assert_eq!(result, Ok(Err("backend down")));
        assert!(!form.is_open());
        assert_eq!(form.value("name"), "");
    }

    #[test]
    fn payload_is_typed_by_column() {
        let mut form = DynamicForm::create(&columns());
        form.set("name", "Widget");
        form.set("qty", "3");
        form.set("done", "false");
        form.set("Owner", "4");
        assert_eq!(
            form.payload().to_json(),
            json!({"name": "Widget", "qty": 3, "done": false, "Owner": 4})
        );
    }

    #[test]
    fn edit_payload_strips_identity_and_timestamps() {
        let columns = vec![
            Column::new("c1", "id", ColumnType::SingleLineText).with_column_name("id"),
            Column::new("c2", "Name", ColumnType::SingleLineText).with_column_name("name"),
        ];
        let row: Row = serde_json::from_value(json!({"id": "r1", "name": "Old", "UpdatedAt": "2024-01-01"})).unwrap();
        let mut form = DynamicForm::edit(&columns, &row);
        assert_eq!(form.value("UpdatedAt"), "2024-01-01");
        form.set("name", "New");
        assert_eq!(form.payload().to_json(), json!({"name": "New"}));
    }

    #[test]
    fn edit_seeds_relation_ids_and_resets_to_row() {
        let row: Row = serde_json::from_value(json!({
            "Id": 1, "name": "Old", "Owner": {"id": 4, "Title": "Ada"}
        }))
        .unwrap();
        let mut form = DynamicForm::edit(&columns(), &row);
        assert_eq!(form.value("Owner"), "4");
        form.set("name", "Changed");
        form.cancel();
        assert!(!form.is_open());
        assert_eq!(form.value("name"), "Old");
    }

    #[test]
    fn empty_values_become_null_except_checkboxes() {
        let col = Column::new("c", "Qty", ColumnType::Decimal);
        assert_eq!(to_cell(&col, ""), CellValue::Null);
        assert_eq!(to_cell(&col, "2.50"), CellValue::Number(serde_json::Number::from_f64(2.5).unwrap()));
        assert_eq!(to_cell(&col, "abc"), CellValue::Text("abc".into()));
        let check = Column::new("c", "Done", ColumnType::Checkbox);
        assert_eq!(to_cell(&check, ""), CellValue::Bool(false));
    }
}
