// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Empty in-memory schema served by `--memory`.

use tabula_model::{Column, ColumnType, TableInfo};
use tabula_store::MemoryStore;

/// Base id of the demo schema.
pub const DEMO_BASE: &str = "demo";

/// Store with an empty `tasks` table linked to an empty `people` table.
pub fn demo_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_base(DEMO_BASE, "Demo");
    let id = || {
        Column::new("id", "Id", ColumnType::Number)
            .with_column_name("Id")
            .primary_key()
    };
    store.add_table(
        DEMO_BASE,
        TableInfo {
            id: "people".into(),
            title: "People".into(),
            table_name: "people".into(),
        },
        vec![
            id(),
            Column::new("pname", "Name", ColumnType::SingleLineText)
                .with_column_name("name")
                .required(),
            Column::new("pmail", "Email", ColumnType::Email).with_column_name("email"),
        ],
    );
    store.add_table(
        DEMO_BASE,
        TableInfo {
            id: "tasks".into(),
            title: "Tasks".into(),
            table_name: "tasks".into(),
        },
        vec![
            id(),
            Column::new("tname", "Name", ColumnType::SingleLineText)
                .with_column_name("name")
                .required(),
            Column::new("tnotes", "Notes", ColumnType::LongText).with_column_name("notes"),
            Column::new("tdone", "Done", ColumnType::Checkbox).with_column_name("done"),
            Column::new("tdue", "Due", ColumnType::Date).with_column_name("due"),
            Column::new("towner", "Owner", ColumnType::LinkToAnotherRecord).links_to("people"),
        ],
    );
    store
}
