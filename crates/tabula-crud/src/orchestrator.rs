// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! State machine over one table's working set.
//!
//! ```text
//! idle -> loading -> idle                 refresh (ok or failed)
//! idle -> submitting -> loading -> idle   create / update
//! idle -> deleting -> loading -> idle     delete
//! ```
//!
//! A successful mutation is always followed by a full re-fetch; the row set
//! is replaced wholesale and never patched locally. A failed call leaves the
//! row set as it was. Every mutation pushes a success or error toast.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tabula_app_core::toast::ToastService;
use tabula_model::{row_identity, Column, ListQuery, Row, RowId, TableRef};
use tabula_store::{RowStore, StoreError};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::form::{DynamicForm, FormError};
use crate::view::TableView;

/// What the orchestrator is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Nothing in flight.
    Idle = 0,
    /// Row set refresh.
    Loading = 1,
    /// Create or update.
    Submitting = 2,
    /// Delete.
    Deleting = 3,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Loading,
            2 => Self::Submitting,
            3 => Self::Deleting,
            _ => Self::Idle,
        }
    }
}

/// Read side of an orchestrator's phase.
///
/// Clones observe the same cell, so a caller can show busy indicators while
/// an operation holds the orchestrator.
#[derive(Debug, Clone)]
pub struct PhaseHandle(Arc<AtomicU8>);

impl PhaseHandle {
    /// Current phase.
    pub fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.get() == Phase::Idle
    }

    /// Refresh in flight.
    pub fn is_loading(&self) -> bool {
        self.get() == Phase::Loading
    }

    /// Create or update in flight.
    pub fn is_submitting(&self) -> bool {
        self.get() == Phase::Submitting
    }

    /// Delete in flight.
    pub fn is_deleting(&self) -> bool {
        self.get() == Phase::Deleting
    }
}

/// Failure of an orchestrated operation.
#[derive(Debug, Error)]
pub enum CrudError {
    /// Another operation is in flight; nothing was sent.
    #[error("busy: {0:?} in progress")]
    Busy(Phase),
    /// The form did not validate; nothing was sent.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The target row has no resolvable identity.
    #[error("row has no identifier")]
    MissingRowId,
    /// The operation needs a dialog that is not open.
    #[error("no {0} dialog is open")]
    NoDialog(&'static str),
}

// Resets the phase to idle when dropped, so a cancelled call cannot leave
// the orchestrator stuck busy.
struct PhaseGuard(Arc<AtomicU8>);

impl PhaseGuard {
    fn enter(cell: &Arc<AtomicU8>, phase: Phase) -> Result<Self, CrudError> {
        cell.compare_exchange(Phase::Idle as u8, phase as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(Arc::clone(cell)))
            .map_err(|current| CrudError::Busy(Phase::from_u8(current)))
    }

    fn advance(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.0.store(Phase::Idle as u8, Ordering::Release);
    }
}

/// Which mutation a toast is about.
#[derive(Clone, Copy)]
enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    fn success(self) -> &'static str {
        match self {
            Self::Create => "Record created successfully",
            Self::Update => "Record updated successfully",
            Self::Delete => "Record deleted successfully",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            Self::Create => "Failed to create record",
            Self::Update => "Failed to update record",
            Self::Delete => "Failed to delete record",
        }
    }
}

/// Coordinates store, forms, and view for one table.
pub struct CrudOrchestrator<S> {
    store: S,
    source: TableRef,
    columns: Vec<Column>,
    rows: Vec<Row>,
    query: ListQuery,
    phase: Arc<AtomicU8>,
    create_form: Option<DynamicForm>,
    edit: Option<(Row, DynamicForm)>,
    delete_target: Option<Row>,
    toasts: ToastService,
}

impl<S: RowStore> CrudOrchestrator<S> {
    /// Orchestrator over `source` with an already-fetched first page.
    pub fn new(store: S, source: TableRef, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            store,
            source,
            columns,
            rows,
            query: ListQuery::default(),
            phase: Arc::new(AtomicU8::new(Phase::Idle as u8)),
            create_form: None,
            edit: None,
            delete_target: None,
            toasts: ToastService::default(),
        }
    }

    /// Query used for every refresh.
    pub fn with_query(mut self, query: ListQuery) -> Self {
        self.query = query;
        self
    }

    /// Table being edited.
    pub fn source(&self) -> &TableRef {
        &self.source
    }

    /// Column set.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Displayed rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Handle that keeps reporting the phase while an operation runs.
    pub fn phase_handle(&self) -> PhaseHandle {
        PhaseHandle(Arc::clone(&self.phase))
    }

    /// Refresh in flight.
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    /// Create or update in flight.
    pub fn is_submitting(&self) -> bool {
        self.phase() == Phase::Submitting
    }

    /// Delete in flight.
    pub fn is_deleting(&self) -> bool {
        self.phase() == Phase::Deleting
    }

    /// Notifications raised so far.
    pub fn toasts(&self) -> &ToastService {
        &self.toasts
    }

    /// Mutable access for dismissing or expiring notifications.
    pub fn toasts_mut(&mut self) -> &mut ToastService {
        &mut self.toasts
    }

    /// Store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read view of the current rows.
    pub fn view(&self) -> TableView<'_> {
        TableView::new(&self.columns, &self.rows)
    }

    /// Identity of `row` per the column set.
    pub fn row_id(&self, row: &Row) -> Option<RowId> {
        row_identity(&self.columns, row)
    }

    /// Re-fetch the row set. On failure the previous rows stay displayed.
    pub async fn refresh(&mut self) -> Result<(), CrudError> {
        let _guard = PhaseGuard::enter(&self.phase, Phase::Loading)?;
        self.reload().await
    }

    async fn reload(&mut self) -> Result<(), CrudError> {
        match self.store.list(&self.source, &self.query).await {
            Ok(page) => {
                debug!(table = %self.source, rows = page.list.len(), "row set refreshed");
                self.rows = page.list;
                Ok(())
            }
            Err(err) => {
                error!(?err, table = %self.source, "refresh failed");
                self.toasts
                    .error("Failed to refresh data", err.summary(), Instant::now());
                Err(err.into())
            }
        }
    }

    // The mutation's own outcome decides the result; a failed follow-up
    // refresh is reported through its toast only.
    async fn finish(
        &mut self,
        guard: &PhaseGuard,
        what: Mutation,
        result: Result<(), StoreError>,
    ) -> Result<(), CrudError> {
        match result {
            Ok(()) => {
                info!(table = %self.source, "{}", what.success());
                self.toasts.success(what.success(), Instant::now());
                guard.advance(Phase::Loading);
                let _ = self.reload().await;
                Ok(())
            }
            Err(err) => {
                error!(?err, table = %self.source, "{}", what.failure());
                self.toasts.error(what.failure(), err.summary(), Instant::now());
                Err(err.into())
            }
        }
    }

    /// Create a row, then refresh.
    pub async fn create(&mut self, data: Row) -> Result<(), CrudError> {
        let guard = PhaseGuard::enter(&self.phase, Phase::Submitting)?;
        let result = self.store.create(&self.source, data).await.map(|_| ());
        self.finish(&guard, Mutation::Create, result).await
    }

    /// Update the row `row_id`, then refresh.
    pub async fn update(&mut self, row_id: &RowId, data: Row) -> Result<(), CrudError> {
        let guard = PhaseGuard::enter(&self.phase, Phase::Submitting)?;
        let result = self
            .store
            .update(&self.source, row_id, data)
            .await
            .map(|_| ());
        self.finish(&guard, Mutation::Update, result).await
    }

    /// Delete the row `row_id`, then refresh.
    pub async fn delete(&mut self, row_id: &RowId) -> Result<(), CrudError> {
        let guard = PhaseGuard::enter(&self.phase, Phase::Deleting)?;
        let result = self.store.delete(&self.source, row_id).await;
        self.finish(&guard, Mutation::Delete, result).await
    }

    /// Open the create dialog.
    pub fn open_create(&mut self) -> &mut DynamicForm {
        self.create_form.insert(DynamicForm::create(&self.columns))
    }

    /// Open create dialog, if any.
    pub fn create_form(&self) -> Option<&DynamicForm> {
        self.create_form.as_ref()
    }

    /// Mutable create dialog, for editing fields.
    pub fn create_form_mut(&mut self) -> Option<&mut DynamicForm> {
        self.create_form.as_mut()
    }

    /// Submit the create dialog.
    ///
    /// A validation failure keeps the dialog open and sends nothing. Once
    /// validation passes the dialog closes whatever the store answers.
    pub async fn submit_create(&mut self) -> Result<(), CrudError> {
        let mut form = self.create_form.take().ok_or(CrudError::NoDialog("create"))?;
        match form.submit(|payload| self.create(payload)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.create_form = Some(form);
                Err(err.into())
            }
        }
    }

    /// Open the edit dialog for the row at `index`.
    pub fn open_edit(&mut self, index: usize) -> Option<&mut DynamicForm> {
        let row = self.rows.get(index)?.clone();
        let form = DynamicForm::edit(&self.columns, &row);
        self.edit = Some((row, form));
        self.edit.as_mut().map(|(_, form)| form)
    }

    /// Open edit dialog, if any.
    pub fn edit_form(&self) -> Option<&DynamicForm> {
        self.edit.as_ref().map(|(_, form)| form)
    }

    /// Mutable edit dialog, for editing fields.
    pub fn edit_form_mut(&mut self) -> Option<&mut DynamicForm> {
        self.edit.as_mut().map(|(_, form)| form)
    }

    /// Close the edit dialog without saving.
    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Submit the edit dialog. Closing follows the create dialog's rules.
    pub async fn submit_edit(&mut self) -> Result<(), CrudError> {
        let (row, mut form) = self.edit.take().ok_or(CrudError::NoDialog("edit"))?;
        let Some(row_id) = self.row_id(&row) else {
            error!(table = %self.source, "edit target has no identifier");
            self.toasts
                .error(Mutation::Update.failure(), "Record has no identifier", Instant::now());
            return Err(CrudError::MissingRowId);
        };
        match form.submit(|payload| self.update(&row_id, payload)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.edit = Some((row, form));
                Err(err.into())
            }
        }
    }

    /// Ask for confirmation before deleting the row at `index`.
    pub fn request_delete(&mut self, index: usize) -> Option<&Row> {
        self.delete_target = self.rows.get(index).cloned();
        self.delete_target.as_ref()
    }

    /// Row awaiting delete confirmation; `Some` while the dialog is open.
    pub fn delete_target(&self) -> Option<&Row> {
        self.delete_target.as_ref()
    }

    /// Dismiss the delete dialog.
    pub fn cancel_delete(&mut self) {
        self.delete_target = None;
    }

    /// Confirm the pending delete. The dialog closes only on success, so a
    /// failed delete can be retried.
    pub async fn confirm_delete(&mut self) -> Result<(), CrudError> {
        let row = self.delete_target.clone().ok_or(CrudError::NoDialog("delete"))?;
        let Some(row_id) = self.row_id(&row) else {
            error!(table = %self.source, "delete target has no identifier");
            self.toasts
                .error(Mutation::Delete.failure(), "Record has no identifier", Instant::now());
            return Err(CrudError::MissingRowId);
        };
        self.delete(&row_id).await?;
        self.delete_target = None;
        Ok(())
    }
}
