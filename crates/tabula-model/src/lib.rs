// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Data model shared by every Tabula crate.
//!
//! The types here mirror what a NocoDB-style backend sends over the wire:
//! [`Column`] metadata keyed by its `uidt` tag, loosely-typed [`Row`] bags
//! narrowed to a closed [`CellValue`] variant, and the composite
//! [`TableRef`] (`"baseId.tableId"`) that every API call is addressed with.
//!
//! Rows are a client-side cache of server state only. Nothing in this crate
//! mutates a row on behalf of the server.
#![forbid(unsafe_code)]

mod column;
mod page;
mod row;
mod source;

pub use column::{Column, ColumnType, RelationDescriptor};
pub use page::{BaseInfo, ListQuery, ListResponse, PageInfo, TableInfo, TableMeta};
pub use row::{row_identity, CellValue, Row, RowId};
pub use source::{SourceError, TableRef};
