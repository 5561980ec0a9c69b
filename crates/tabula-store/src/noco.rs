// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! NocoDB v2 REST adapter.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tabula_model::{BaseInfo, Column, ListQuery, ListResponse, Row, RowId, TableInfo, TableMeta, TableRef};
use tracing::debug;

use crate::{
    LocatedTable, RelatedRows, RetryPolicy, RowStore, SchemaProvider, StoreError, StoreErrorKind,
    StoreOp, TableLocator,
};

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "xc-token";
/// Primary key field name the v2 records API expects in mutation bodies.
pub const ID_FIELD: &str = "Id";
/// Upper bound on rows fetched for a relation picker.
pub const RELATED_ROWS_LIMIT: u32 = 1000;

#[derive(Deserialize)]
struct Listed<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

/// HTTP client for a NocoDB instance.
#[derive(Clone)]
pub struct NocoClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    policy: RetryPolicy,
}

impl NocoClient {
    /// Client for `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>, token: Option<String>, policy: RetryPolicy) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, token, policy)
    }

    /// Client reusing an existing `reqwest::Client`.
    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
        policy: RetryPolicy,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token,
            policy,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        op: StoreOp,
        label: &str,
        builder: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::new(op, label, StoreErrorKind::Transport(e.to_string())))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::new(op, label, StoreErrorKind::Transport(e.to_string())))?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(op, label));
        }
        if !status.is_success() {
            return Err(StoreError::new(
                op,
                label,
                StoreErrorKind::Backend {
                    status: status.as_u16(),
                    message: backend_message(&body),
                },
            ));
        }
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body)
            .map_err(|e| StoreError::new(op, label, StoreErrorKind::Decode(e.to_string())))
    }

    async fn read<T: DeserializeOwned>(
        &self,
        op: StoreOp,
        label: &str,
        path: &str,
        pairs: &[(&'static str, String)],
    ) -> Result<T, StoreError> {
        self.policy
            .run(op, label, || {
                Self::send(op, label, self.request(Method::GET, path).query(pairs))
            })
            .await
    }

    async fn write<T: DeserializeOwned>(
        &self,
        op: StoreOp,
        label: &str,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<T, StoreError> {
        self.policy
            .run(op, label, || {
                Self::send(op, label, self.request(method.clone(), path).json(body))
            })
            .await
    }

    // Mutations answer with the primary key only; read the row back so callers
    // see it as stored. A failed read-back falls back to the mutation answer.
    async fn read_back(&self, op: StoreOp, table: &TableRef, answer: Row) -> Result<Row, StoreError> {
        let Some(id) = answer.get_non_null(ID_FIELD).and_then(RowId::from_cell) else {
            return Ok(answer);
        };
        let label = table.to_string();
        let path = format!("/api/v2/tables/{}/records/{}", table.table_id, id);
        match self.read::<Row>(StoreOp::List, &label, &path, &[]).await {
            Ok(row) => Ok(row),
            Err(err) if err.is_not_found() => Err(StoreError::not_found(op, label)),
            Err(err) => {
                debug!(?err, table = %label, "read-back failed; returning mutation answer");
                Ok(answer)
            }
        }
    }
}

fn backend_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| ["msg", "message", "error"].iter().find_map(|k| v.get(*k)?.as_str()))
        .map_or_else(|| body.trim().to_string(), str::to_string)
}

fn with_id(data: Row, row_id: &RowId) -> Value {
    let mut body = data.to_json();
    if let Value::Object(map) = &mut body {
        map.insert(ID_FIELD.to_string(), row_id.to_json());
    }
    body
}

impl SchemaProvider for NocoClient {
    async fn columns(&self, table: &TableRef) -> Result<Vec<Column>, StoreError> {
        let path = format!("/api/v2/meta/tables/{}", table.table_id);
        let meta: TableMeta = self
            .read(StoreOp::Columns, &table.to_string(), &path, &[])
            .await?;
        Ok(meta.columns)
    }
}

impl RowStore for NocoClient {
    async fn list(&self, table: &TableRef, query: &ListQuery) -> Result<ListResponse, StoreError> {
        let path = format!("/api/v2/tables/{}/records", table.table_id);
        self.read(StoreOp::List, &table.to_string(), &path, &query.to_pairs())
            .await
    }

    async fn create(&self, table: &TableRef, data: Row) -> Result<Row, StoreError> {
        let path = format!("/api/v2/tables/{}/records", table.table_id);
        let answer: Row = self
            .write(
                StoreOp::Create,
                &table.to_string(),
                Method::POST,
                &path,
                &data.to_json(),
            )
            .await?;
        self.read_back(StoreOp::Create, table, answer).await
    }

    async fn update(&self, table: &TableRef, row_id: &RowId, data: Row) -> Result<Row, StoreError> {
        let path = format!("/api/v2/tables/{}/records", table.table_id);
        let answer: Row = self
            .write(
                StoreOp::Update,
                &table.to_string(),
                Method::PATCH,
                &path,
                &with_id(data, row_id),
            )
            .await?;
        self.read_back(StoreOp::Update, table, answer).await
    }

    async fn delete(&self, table: &TableRef, row_id: &RowId) -> Result<(), StoreError> {
        let path = format!("/api/v2/tables/{}/records", table.table_id);
        let _: Value = self
            .write(
                StoreOp::Delete,
                &table.to_string(),
                Method::DELETE,
                &path,
                &with_id(Row::new(), row_id),
            )
            .await?;
        Ok(())
    }
}

impl TableLocator for NocoClient {
    async fn find_table(&self, name: &str) -> Result<Option<LocatedTable>, StoreError> {
        let bases: Listed<BaseInfo> = self
            .read(StoreOp::FindTable, name, "/api/v2/meta/bases", &[])
            .await?;
        for base in bases.list {
            let path = format!("/api/v2/meta/bases/{}/tables", base.id);
            let tables: Listed<TableInfo> = self.read(StoreOp::FindTable, name, &path, &[]).await?;
            if let Some(table) = tables.list.into_iter().find(|t| t.matches_name(name)) {
                return Ok(Some(LocatedTable {
                    table,
                    base_id: base.id,
                }));
            }
        }
        Ok(None)
    }
}

impl RelatedRows for NocoClient {
    async fn related_rows(&self, table_id: &str) -> Result<Vec<Row>, StoreError> {
        let path = format!("/api/v2/tables/{table_id}/records");
        let page: ListResponse = self
            .read(
                StoreOp::RelatedRows,
                table_id,
                &path,
                &ListQuery::limit(RELATED_ROWS_LIMIT).to_pairs(),
            )
            .await?;
        Ok(page.list)
    }
}
