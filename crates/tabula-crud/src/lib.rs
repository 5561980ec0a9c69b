// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema-driven CRUD engine.
//!
//! Column metadata drives everything here: [`field::render`] maps one column
//! to an editable control, [`DynamicForm`] collects and validates values for
//! create or edit, [`TableView`] renders rows, and [`CrudOrchestrator`] applies
//! mutations through a [`tabula_store::RowStore`] and re-fetches the row set
//! after each success. The displayed rows are never patched locally.
#![forbid(unsafe_code)]

pub mod attachment;
pub mod block;
pub mod datetime;
pub mod field;
pub mod form;
pub mod orchestrator;
pub mod relation;
pub mod view;

pub use block::{ErrorPanel, ReadyTable, TableBlock};
pub use field::{FieldControl, FieldSpec};
pub use form::{DynamicForm, FormError, FormMode, ValidationError};
pub use orchestrator::{CrudError, CrudOrchestrator, Phase, PhaseHandle};
pub use view::{TableView, visible_columns};
