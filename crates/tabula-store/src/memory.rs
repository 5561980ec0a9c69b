// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-process backend implementing every store port.
//!
//! [`MemoryStore`] behaves like a small NocoDB: tables live in bases, primary
//! keys auto-increment, required columns are enforced on create, and list
//! calls honour `limit`/`offset`, a `(field,op,value)` filter, and a single
//! sort field. Clones share state.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tabula_model::{
    row_identity, CellValue, Column, ListQuery, ListResponse, PageInfo, Row, RowId, TableInfo,
    TableRef,
};

use crate::{
    LocatedTable, RelatedRows, RowStore, SchemaProvider, StoreError, StoreErrorKind, StoreOp,
    TableLocator,
};

/// Page size used when a list call sets no limit.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// In-memory store. Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    // base id -> title, in insertion order of ids
    bases: BTreeMap<String, String>,
    tables: BTreeMap<String, MemoryTable>,
}

struct MemoryTable {
    base_id: String,
    info: TableInfo,
    columns: Vec<Column>,
    rows: Vec<Row>,
    // `None` once every positive i64 id has been handed out.
    next_id: Option<i64>,
}

impl MemoryTable {
    fn id_key(&self) -> String {
        self.columns
            .iter()
            .find(|c| c.pk)
            .and_then(|c| c.key().map(str::to_string))
            .unwrap_or_else(|| "Id".to_string())
    }

    fn allocate_id(&mut self) -> Option<i64> {
        let id = self.next_id?;
        self.next_id = id.checked_add(1);
        Some(id)
    }

    fn reserve(&mut self, taken: i64) {
        if self.next_id.is_some_and(|next| taken >= next) {
            self.next_id = taken.checked_add(1);
        }
    }

    fn position(&self, row_id: &RowId) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| row_identity(&self.columns, r).as_ref() == Some(row_id))
    }
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a base.
    pub fn add_base(&self, id: impl Into<String>, title: impl Into<String>) {
        self.lock().bases.insert(id.into(), title.into());
    }

    /// Register a table in `base_id` (the base is created if missing) and
    /// return its reference.
    pub fn add_table(&self, base_id: &str, info: TableInfo, columns: Vec<Column>) -> TableRef {
        let mut inner = self.lock();
        inner
            .bases
            .entry(base_id.to_string())
            .or_insert_with(|| base_id.to_string());
        let source = TableRef::new(base_id, info.id.clone());
        inner.tables.insert(
            info.id.clone(),
            MemoryTable {
                base_id: base_id.to_string(),
                info,
                columns,
                rows: Vec::new(),
                next_id: Some(1),
            },
        );
        source
    }

    /// Seed a row without validation. The primary key is assigned when absent.
    /// `None` when the table is unknown or its id space is used up.
    pub fn seed(&self, table: &TableRef, mut row: Row) -> Option<Row> {
        let mut inner = self.lock();
        let t = inner.tables.get_mut(&table.table_id)?;
        let key = t.id_key();
        match row.get_non_null(&key).and_then(RowId::from_cell) {
            Some(RowId::Int(n)) => t.reserve(n),
            Some(RowId::Text(_)) => {}
            None => {
                row.insert(key, t.allocate_id()?);
            }
        }
        t.rows.push(row.clone());
        Some(row)
    }

    /// Snapshot of every row in `table`.
    pub fn rows(&self, table: &TableRef) -> Vec<Row> {
        self.lock()
            .tables
            .get(&table.table_id)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn with_table<T>(
        &self,
        op: StoreOp,
        table: &TableRef,
        f: impl FnOnce(&mut MemoryTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self.lock();
        match inner.tables.get_mut(&table.table_id) {
            Some(t) if t.base_id == table.base_id => f(t),
            _ => Err(StoreError::not_found(op, table.to_string())),
        }
    }
}

fn is_blank(value: Option<&CellValue>) -> bool {
    match value {
        None | Some(CellValue::Null) => true,
        Some(CellValue::Text(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Eq(String, String),
    Neq(String, String),
    Like(String, String),
}

impl Filter {
    fn parse_all(expr: &str) -> Result<Vec<Self>, String> {
        expr.split("~and")
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(Self::parse)
            .collect()
    }

    fn parse(clause: &str) -> Result<Self, String> {
        let inner = clause
            .strip_prefix('(')
            .and_then(|c| c.strip_suffix(')'))
            .ok_or_else(|| format!("invalid where clause: {clause}"))?;
        let mut parts = inner.splitn(3, ',');
        let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("invalid where clause: {clause}"));
        };
        let (field, value) = (field.trim().to_string(), value.trim().to_string());
        match op.trim() {
            "eq" => Ok(Self::Eq(field, value)),
            "neq" => Ok(Self::Neq(field, value)),
            "like" => Ok(Self::Like(field, value.replace('%', ""))),
            other => Err(format!("unsupported comparison operator: {other}")),
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let text = |field: &str| {
            row.get(field)
                .map(CellValue::to_form_string)
                .unwrap_or_default()
        };
        match self {
            Self::Eq(field, value) => text(field) == *value,
            Self::Neq(field, value) => text(field) != *value,
            Self::Like(field, value) => text(field)
                .to_lowercase()
                .contains(&value.to_lowercase()),
        }
    }
}

fn compare_cells(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    match (a, b) {
        (Some(CellValue::Number(x)), Some(CellValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (None | Some(CellValue::Null), None | Some(CellValue::Null)) => Ordering::Equal,
        (None | Some(CellValue::Null), _) => Ordering::Less,
        (_, None | Some(CellValue::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_form_string().cmp(&y.to_form_string()),
    }
}

fn page_info(total: usize, offset: usize, limit: usize) -> PageInfo {
    let page = if limit == 0 { 1 } else { offset / limit + 1 };
    PageInfo {
        total_rows: Some(total as u64),
        page: Some(page as u64),
        page_size: Some(limit as u64),
        is_first_page: Some(offset == 0),
        is_last_page: Some(offset.saturating_add(limit) >= total),
    }
}

impl SchemaProvider for MemoryStore {
    async fn columns(&self, table: &TableRef) -> Result<Vec<Column>, StoreError> {
        self.with_table(StoreOp::Columns, table, |t| Ok(t.columns.clone()))
    }
}

impl RowStore for MemoryStore {
    async fn list(&self, table: &TableRef, query: &ListQuery) -> Result<ListResponse, StoreError> {
        let label = table.to_string();
        self.with_table(StoreOp::List, table, |t| {
            let filters = match query.where_clause.as_deref() {
                Some(expr) => Filter::parse_all(expr)
                    .map_err(|msg| StoreError::invalid(StoreOp::List, label.clone(), msg))?,
                None => Vec::new(),
            };
            let mut rows: Vec<Row> = t
                .rows
                .iter()
                .filter(|r| filters.iter().all(|f| f.matches(r)))
                .cloned()
                .collect();
            if let Some(sort) = query.sort.as_deref().filter(|s| !s.is_empty()) {
                let (field, descending) = match sort.strip_prefix('-') {
                    Some(field) => (field, true),
                    None => (sort, false),
                };
                rows.sort_by(|a, b| {
                    let ord = compare_cells(a.get(field), b.get(field));
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
            }
            let total = rows.len();
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
            let list = rows.into_iter().skip(offset).take(limit).collect();
            Ok(ListResponse {
                list,
                page_info: page_info(total, offset, limit),
            })
        })
    }

    async fn create(&self, table: &TableRef, data: Row) -> Result<Row, StoreError> {
        let label = table.to_string();
        self.with_table(StoreOp::Create, table, |t| {
            for col in t.columns.iter().filter(|c| c.rqd && !c.pk && !c.ai) {
                let Some(key) = col.key() else { continue };
                if is_blank(data.get(key)) {
                    return Err(StoreError::invalid(
                        StoreOp::Create,
                        label.clone(),
                        format!("{} is required", col.title),
                    ));
                }
            }
            let Some(id) = t.allocate_id() else {
                return Err(StoreError::new(
                    StoreOp::Create,
                    label.clone(),
                    StoreErrorKind::Backend {
                        status: 500,
                        message: "primary key space exhausted".into(),
                    },
                ));
            };
            let key = t.id_key();
            let mut row = data;
            row.insert(key, id);
            t.rows.push(row.clone());
            Ok(row)
        })
    }

    async fn update(&self, table: &TableRef, row_id: &RowId, data: Row) -> Result<Row, StoreError> {
        let label = table.to_string();
        self.with_table(StoreOp::Update, table, |t| {
            let idx = t
                .position(row_id)
                .ok_or_else(|| StoreError::not_found(StoreOp::Update, label.clone()))?;
            let key = t.id_key();
            let row = &mut t.rows[idx];
            for (k, v) in data {
                if k != key {
                    row.insert(k, v);
                }
            }
            Ok(row.clone())
        })
    }

    async fn delete(&self, table: &TableRef, row_id: &RowId) -> Result<(), StoreError> {
        let label = table.to_string();
        self.with_table(StoreOp::Delete, table, |t| {
            let idx = t
                .position(row_id)
                .ok_or_else(|| StoreError::not_found(StoreOp::Delete, label.clone()))?;
            t.rows.remove(idx);
            Ok(())
        })
    }
}

impl TableLocator for MemoryStore {
    async fn find_table(&self, name: &str) -> Result<Option<LocatedTable>, StoreError> {
        let inner = self.lock();
        let found = inner.bases.keys().find_map(|base_id| {
            inner
                .tables
                .values()
                .find(|t| &t.base_id == base_id && t.info.matches_name(name))
                .map(|t| LocatedTable {
                    table: t.info.clone(),
                    base_id: base_id.clone(),
                })
        });
        Ok(found)
    }
}

impl RelatedRows for MemoryStore {
    async fn related_rows(&self, table_id: &str) -> Result<Vec<Row>, StoreError> {
        self.lock()
            .tables
            .get(table_id)
            .map(|t| t.rows.clone())
            .ok_or_else(|| StoreError::not_found(StoreOp::RelatedRows, table_id))
    }
}
