// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table block: resolve a table by name and load it for display.
//!
//! Every failure becomes an inline [`ErrorPanel`]; loading never errors out.

use tabula_model::{Column, ListQuery, Row, TableRef};
use tabula_store::{RowStore, SchemaProvider, TableLocator};
use tracing::{error, warn};

use crate::orchestrator::CrudOrchestrator;
use crate::view::visible_columns;

/// Rows fetched for the first render.
pub const INITIAL_ROW_LIMIT: u32 = 100;

/// A table ready to show.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyTable {
    /// Display title.
    pub title: String,
    /// Internal name, shown under the title when non-empty.
    pub table_name: String,
    /// `baseId.tableId` used for every later call.
    pub source: TableRef,
    /// Columns with system columns removed.
    pub columns: Vec<Column>,
    /// First page of rows.
    pub rows: Vec<Row>,
}

/// Outcome of loading a table block.
#[derive(Debug, Clone, PartialEq)]
pub enum TableBlock {
    /// Loaded.
    Ready(ReadyTable),
    /// The block names no table.
    NoSource,
    /// No base has a table with this name.
    TableNotFound(String),
    /// The table exists but reports no columns.
    NoColumns(String),
    /// A backend call failed.
    LoadFailed(String),
}

/// Inline error text shown in place of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    /// Headline.
    pub title: String,
    /// Supporting lines.
    pub details: Vec<String>,
}

impl TableBlock {
    /// Resolve `name` and fetch the table's columns and first page.
    pub async fn load<S>(store: &S, name: Option<&str>) -> Self
    where
        S: TableLocator + SchemaProvider + RowStore + Sync,
    {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Self::NoSource;
        };
        let located = match store.find_table(name).await {
            Ok(Some(located)) => located,
            Ok(None) => {
                warn!(table = name, "table block names an unknown table");
                return Self::TableNotFound(name.to_string());
            }
            Err(err) => {
                error!(?err, table = name, "table lookup failed");
                return Self::LoadFailed(err.summary());
            }
        };
        let source = located.source();
        let query = ListQuery::limit(INITIAL_ROW_LIMIT);
        let (columns, page) = tokio::join!(store.columns(&source), store.list(&source, &query));
        let (columns, page) = match (columns, page) {
            (Ok(columns), Ok(page)) => (columns, page),
            (Err(err), _) | (_, Err(err)) => {
                error!(?err, table = %source, "table block load failed");
                return Self::LoadFailed(err.summary());
            }
        };
        if columns.is_empty() {
            return Self::NoColumns(located.table.title);
        }
        Self::Ready(ReadyTable {
            title: located.table.title,
            table_name: located.table.table_name,
            source,
            columns: visible_columns(&columns),
            rows: page.list,
        })
    }

    /// Error panel for the failure variants; `None` when ready.
    pub fn panel(&self) -> Option<ErrorPanel> {
        let (title, details) = match self {
            Self::Ready(_) => return None,
            Self::NoSource => (
                "Error: No data source specified".to_string(),
                vec!["Please provide a table name (e.g., \"tasks\" or \"customers\")".to_string()],
            ),
            Self::TableNotFound(name) => (
                format!("Error: Table \"{name}\" not found"),
                vec![
                    "Make sure the table name is correct and exists in your NocoDB instance."
                        .to_string(),
                ],
            ),
            Self::NoColumns(title) => (
                format!("Error: No columns found for table \"{title}\""),
                Vec::new(),
            ),
            Self::LoadFailed(message) => (
                "Error loading table data".to_string(),
                vec![
                    message.clone(),
                    "Make sure NOCODB_URL and NOCODB_API_TOKEN are configured correctly."
                        .to_string(),
                ],
            ),
        };
        Some(ErrorPanel { title, details })
    }

    /// Orchestrator over a ready table. Refreshes re-fetch the same first page.
    pub fn into_orchestrator<S: RowStore>(self, store: S) -> Option<CrudOrchestrator<S>> {
        match self {
            Self::Ready(table) => Some(
                CrudOrchestrator::new(store, table.source, table.columns, table.rows)
                    .with_query(ListQuery::limit(INITIAL_ROW_LIMIT)),
            ),
            _ => None,
        }
    }
}
