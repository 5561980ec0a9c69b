// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Row store wrapper with call counting and injected failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Semaphore;

use tabula_model::{Column, ListQuery, ListResponse, Row, RowId, TableRef};
use tabula_store::{
    LocatedTable, MemoryStore, RelatedRows, RowStore, SchemaProvider, StoreError, StoreErrorKind,
    StoreOp, TableLocator,
};

/// Hold point for one operation, returned by [`ScriptedStore::pause`].
///
/// Calls that reach a closed gate wait until [`open`](Self::open); once open
/// it stays open.
#[derive(Debug, Clone)]
pub struct Gate {
    arrived: Arc<Semaphore>,
    release: Arc<Semaphore>,
}

impl Gate {
    fn new() -> Self {
        Self {
            arrived: Arc::new(Semaphore::new(0)),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    /// Wait until one more call is held at the gate.
    pub async fn arrived(&self) {
        if let Ok(permit) = self.arrived.acquire().await {
            permit.forget();
        }
    }

    /// Release every held call and let later ones straight through.
    pub fn open(&self) {
        // A closed semaphore fails every acquire immediately.
        self.release.close();
    }

    async fn pass(&self) {
        self.arrived.add_permits(1);
        let _released = self.release.acquire().await;
    }
}

/// [`MemoryStore`] behind a switchboard of per-operation failures.
///
/// Every call is counted, failed ones included. A failing operation never
/// reaches the wrapped store, so its state is untouched. Clones share both the
/// counters and the wrapped store.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    memory: MemoryStore,
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    calls: HashMap<StoreOp, usize>,
    failing: HashMap<StoreOp, StoreErrorKind>,
    gates: HashMap<StoreOp, Gate>,
}

impl ScriptedStore {
    /// Wrap `memory`.
    pub fn new(memory: MemoryStore) -> Self {
        Self {
            memory,
            script: Arc::default(),
        }
    }

    /// The wrapped store, for seeding and inspection.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Calls made to `op` so far.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Make `op` fail with a 500 until [`recover`](Self::recover) is called.
    pub fn fail(&self, op: StoreOp) {
        self.fail_with(
            op,
            StoreErrorKind::Backend {
                status: 500,
                message: format!("simulated {op} failure"),
            },
        );
    }

    /// Make `op` fail with `kind`.
    pub fn fail_with(&self, op: StoreOp, kind: StoreErrorKind) {
        self.lock().failing.insert(op, kind);
    }

    /// Let `op` reach the wrapped store again.
    pub fn recover(&self, op: StoreOp) {
        self.lock().failing.remove(&op);
    }

    /// Hold every call to `op` at a gate until it is opened.
    pub fn pause(&self, op: StoreOp) -> Gate {
        let gate = Gate::new();
        self.lock().gates.insert(op, gate.clone());
        gate
    }

    // Count the call, wait at any gate, then report any scripted failure. The
    // lock is released before anything is awaited.
    async fn enter(&self, op: StoreOp, target: &str) -> Result<(), StoreError> {
        let (result, gate) = {
            let mut script = self.lock();
            *script.calls.entry(op).or_default() += 1;
            let result = match script.failing.get(&op) {
                Some(kind) => Err(StoreError::new(op, target, kind.clone())),
                None => Ok(()),
            };
            (result, script.gates.get(&op).cloned())
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        result
    }
}

impl SchemaProvider for ScriptedStore {
    async fn columns(&self, table: &TableRef) -> Result<Vec<Column>, StoreError> {
        self.enter(StoreOp::Columns, &table.to_string()).await?;
        self.memory.columns(table).await
    }
}

impl RowStore for ScriptedStore {
    async fn list(&self, table: &TableRef, query: &ListQuery) -> Result<ListResponse, StoreError> {
        self.enter(StoreOp::List, &table.to_string()).await?;
        self.memory.list(table, query).await
    }

    async fn create(&self, table: &TableRef, data: Row) -> Result<Row, StoreError> {
        self.enter(StoreOp::Create, &table.to_string()).await?;
        self.memory.create(table, data).await
    }

    async fn update(&self, table: &TableRef, row_id: &RowId, data: Row) -> Result<Row, StoreError> {
        self.enter(StoreOp::Update, &table.to_string()).await?;
        self.memory.update(table, row_id, data).await
    }

    async fn delete(&self, table: &TableRef, row_id: &RowId) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete, &table.to_string()).await?;
        self.memory.delete(table, row_id).await
    }
}

impl TableLocator for ScriptedStore {
    async fn find_table(&self, name: &str) -> Result<Option<LocatedTable>, StoreError> {
        self.enter(StoreOp::FindTable, name).await?;
        self.memory.find_table(name).await
    }
}

impl RelatedRows for ScriptedStore {
    async fn related_rows(&self, table_id: &str) -> Result<Vec<Row>, StoreError> {
        self.enter(StoreOp::RelatedRows, table_id).await?;
        self.memory.related_rows(table_id).await
    }
}
