// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Demo base with a tasks table linked to a people table.

use tabula_model::{CellValue, Column, ColumnType, Row, TableInfo, TableRef};
use tabula_store::MemoryStore;

use crate::ScriptedStore;

/// Id of the demo base.
pub const BASE_ID: &str = "p1";
/// Table id of the tasks table.
pub const TASKS_TABLE: &str = "t2";
/// Table id of the people table.
pub const PEOPLE_TABLE: &str = "t3";

/// Columns of the tasks table, as the backend reports them.
pub fn task_columns() -> Vec<Column> {
    vec![
        Column::new("c0", "Id", ColumnType::Number)
            .with_column_name("Id")
            .primary_key(),
        Column::new("c1", "Name", ColumnType::SingleLineText)
            .with_column_name("name")
            .required(),
        Column::new("c2", "Done", ColumnType::Checkbox).with_column_name("done"),
        Column::new("c3", "Due", ColumnType::Date).with_column_name("due"),
        Column::new("c4", "CreatedAt", ColumnType::DateTime).with_column_name("created_at"),
        Column::new("c5", "Owner", ColumnType::LinkToAnotherRecord).links_to(PEOPLE_TABLE),
    ]
}

/// Columns of the people table.
pub fn people_columns() -> Vec<Column> {
    vec![
        Column::new("p0", "Id", ColumnType::Number)
            .with_column_name("Id")
            .primary_key(),
        Column::new("p1", "Name", ColumnType::SingleLineText)
            .with_column_name("name")
            .required(),
        Column::new("p2", "Email", ColumnType::Email).with_column_name("email"),
    ]
}

fn named(name: &str) -> Row {
    [("name", CellValue::from(name))].into_iter().collect()
}

/// Demo store with an empty tasks table and two people. Returns the tasks
/// table reference.
pub fn demo_store() -> (MemoryStore, TableRef) {
    let memory = MemoryStore::new();
    memory.add_base(BASE_ID, "Demo");
    let tasks = memory.add_table(
        BASE_ID,
        TableInfo {
            id: TASKS_TABLE.into(),
            title: "Tasks".into(),
            table_name: "tasks".into(),
        },
        task_columns(),
    );
    let people = memory.add_table(
        BASE_ID,
        TableInfo {
            id: PEOPLE_TABLE.into(),
            title: "People".into(),
            table_name: "people".into(),
        },
        people_columns(),
    );
    for name in ["Ada", "Grace"] {
        memory.seed(&people, named(name));
    }
    (memory, tasks)
}

/// Scripted demo store with `n` tasks named `Task 1` through `Task n`.
pub fn seeded_tasks(n: usize) -> (ScriptedStore, TableRef) {
    let (memory, tasks) = demo_store();
    for i in 1..=n {
        memory.seed(&tasks, named(&format!("Task {i}")));
    }
    (ScriptedStore::new(memory), tasks)
}
