// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read display of a row set.

use tabula_model::{CellValue, Column, ColumnType, Row};

use crate::datetime;

/// Columns the table never shows, matched on storage name or title.
pub const HIDDEN_COLUMNS: [&str; 6] = ["Id", "id", "nc_created_by", "nc_updated_by", "CreatedAt", "UpdatedAt"];

/// Storage names dropped before columns reach a table block.
pub const BLOCK_SYSTEM_COLUMNS: [&str; 5] =
    ["created_at", "updated_at", "nc_created_by", "nc_updated_by", "nc_order"];

/// Shown in place of rows when the set is empty.
pub const EMPTY_MESSAGE: &str = "No records found. Click \"Add Record\" to create one.";

/// Header of the actions column.
pub const ACTIONS_HEADER: &str = "Actions";

/// Drop system columns by case-insensitive storage name.
pub fn visible_columns(columns: &[Column]) -> Vec<Column> {
    columns
        .iter()
        .filter(|c| {
            let name = c.column_name.as_deref().map(str::to_ascii_lowercase);
            !name.is_some_and(|n| BLOCK_SYSTEM_COLUMNS.contains(&n.as_str()))
        })
        .cloned()
        .collect()
}

fn truthy(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => false,
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        CellValue::Text(s) => s == "true" || s == "1",
        CellValue::Json(_) => true,
    }
}

/// Display text for one cell.
///
/// Null is `-`, checkboxes are `✓`/`✗`, dates render as `YYYY-MM-DD` and
/// date-times as `YYYY-MM-DD HH:MM` (UTC). Objects and lists render as JSON.
/// Values that fail to parse as dates are shown as stored.
pub fn format_cell(cell: Option<&CellValue>, column: &Column) -> String {
    let Some(cell) = cell.filter(|c| !c.is_null()) else {
        return "-".into();
    };
    match (&column.uidt, cell) {
        (ColumnType::Checkbox, cell) => (if truthy(cell) { "✓" } else { "✗" }).to_string(),
        (ColumnType::Date, CellValue::Text(s)) => datetime::parse_date(s)
            .map_or_else(|| s.clone(), datetime::format_date),
        (ColumnType::DateTime, CellValue::Text(s)) => datetime::parse_timestamp(s)
            .map_or_else(|| s.clone(), |ts| ts.format("%Y-%m-%d %H:%M").to_string()),
        (_, other) => other.to_form_string(),
    }
}

/// Per-row affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Open the edit form.
    Edit,
    /// Ask to delete.
    Delete,
}

impl RowAction {
    /// Both actions, in display order.
    pub const ALL: [Self; 2] = [Self::Edit, Self::Delete];

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }
}

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    /// Index into the row set, for actions.
    pub index: usize,
    /// Cell text per visible column.
    pub cells: Vec<String>,
}

/// Table of rows over the displayable columns.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    columns: Vec<&'a Column>,
    rows: &'a [Row],
}

impl<'a> TableView<'a> {
    /// View of `rows`, hiding primary keys and [`HIDDEN_COLUMNS`].
    pub fn new(columns: &'a [Column], rows: &'a [Row]) -> Self {
        let columns = columns
            .iter()
            .filter(|c| !c.pk && !HIDDEN_COLUMNS.iter().any(|h| c.is_named(h)))
            .collect();
        Self { columns, rows }
    }

    /// Displayed columns.
    pub fn columns(&self) -> &[&'a Column] {
        &self.columns
    }

    /// Column titles followed by the actions header.
    pub fn headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.title.as_str())
            .chain([ACTIONS_HEADER])
            .collect()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Message to show instead of rows, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_MESSAGE)
    }

    /// Formatted cells of one row.
    pub fn cells(&self, row: &Row) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format_cell(c.key().and_then(|k| row.get(k)), c))
            .collect()
    }

    /// Every row, formatted.
    pub fn body(&self) -> Vec<RenderedRow> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| RenderedRow {
                index,
                cells: self.cells(row),
            })
            .collect()
    }

    /// Actions offered on each row.
    pub fn actions(&self) -> [RowAction; 2] {
        RowAction::ALL
    }
}
