// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema and row store ports for Tabula.
//!
//! The CRUD engine never talks to a backend directly. It goes through the
//! traits in this crate:
//!
//! - [`SchemaProvider`]: column metadata for a [`TableRef`].
//! - [`RowStore`]: paginated reads and single-row create/update/delete.
//! - [`TableLocator`]: resolve a human table name to a table and its base.
//! - [`RelatedRows`]: rows of a related table, for link-to-record pickers.
//!
//! Three adapters ship here: [`MemoryStore`] (in-process, used by tests and the
//! gateway's demo mode), [`NocoClient`] (NocoDB v2 REST), and [`GatewayClient`]
//! (a running Tabula gateway's `/api/rows` surface).
//!
//! All failures surface as [`StoreError`], which names the operation and the
//! table. Callers must not assume partial success on error.
#![forbid(unsafe_code)]

mod error;
mod gateway;
mod memory;
mod noco;
mod retry;

pub use error::{StoreError, StoreErrorKind, StoreOp};
pub use gateway::GatewayClient;
pub use memory::MemoryStore;
pub use noco::NocoClient;
pub use retry::RetryPolicy;

use std::future::Future;

use serde::{Deserialize, Serialize};
use tabula_model::{Column, ListQuery, ListResponse, Row, RowId, TableInfo, TableRef};

/// Column metadata source.
pub trait SchemaProvider {
    /// Columns of `table`, in backend order.
    fn columns(
        &self,
        table: &TableRef,
    ) -> impl Future<Output = Result<Vec<Column>, StoreError>> + Send;
}

/// Row reads and single-row mutations against one backend.
pub trait RowStore {
    /// One page of rows. Unset query fields are omitted from the request.
    fn list(
        &self,
        table: &TableRef,
        query: &ListQuery,
    ) -> impl Future<Output = Result<ListResponse, StoreError>> + Send;

    /// Create a row and return it as stored.
    fn create(
        &self,
        table: &TableRef,
        data: Row,
    ) -> impl Future<Output = Result<Row, StoreError>> + Send;

    /// Update the row identified by `row_id`. A missing row is
    /// [`StoreErrorKind::NotFound`].
    fn update(
        &self,
        table: &TableRef,
        row_id: &RowId,
        data: Row,
    ) -> impl Future<Output = Result<Row, StoreError>> + Send;

    /// Delete the row identified by `row_id`.
    fn delete(
        &self,
        table: &TableRef,
        row_id: &RowId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A table found by name, with the base it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedTable {
    /// The table.
    pub table: TableInfo,
    /// Base holding the table.
    #[serde(rename = "baseId")]
    pub base_id: String,
}

impl LocatedTable {
    /// `baseId.tableId` reference for the located table.
    pub fn source(&self) -> TableRef {
        TableRef::new(self.base_id.clone(), self.table.id.clone())
    }
}

/// Resolves human table names.
pub trait TableLocator {
    /// Scan every base for a table whose title or internal name matches `name`
    /// case-insensitively. `Ok(None)` when nothing matches.
    fn find_table(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<LocatedTable>, StoreError>> + Send;
}

/// Rows of a table addressed by table id alone, for relation pickers.
pub trait RelatedRows {
    /// Rows of the related table `table_id`.
    fn related_rows(
        &self,
        table_id: &str,
    ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;
}
