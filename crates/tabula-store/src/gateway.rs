// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Client for a running Tabula gateway (`/api/rows`, `/api/columns`, `/api/tables`).
//!
//! Lets a CRUD orchestrator run against the proxy surface instead of holding
//! backend credentials itself.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tabula_model::{Column, ListQuery, ListResponse, Row, RowId, TableRef};

use crate::{
    LocatedTable, RetryPolicy, RowStore, SchemaProvider, StoreError, StoreErrorKind, StoreOp,
    TableLocator,
};

#[derive(Deserialize)]
struct RowEnvelope {
    row: Row,
}

#[derive(Deserialize)]
struct ColumnsEnvelope {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// HTTP client for the gateway's proxy routes.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl GatewayClient {
    /// Client for a gateway at `base_url` (e.g. `http://127.0.0.1:8787`).
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(
        op: StoreOp,
        label: &str,
        builder: RequestBuilder,
    ) -> Result<T, StoreError> {
        let transport = |e: reqwest::Error| {
            StoreError::new(op, label, StoreErrorKind::Transport(e.to_string()))
        };
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| StoreError::new(op, label, StoreErrorKind::Decode(e.to_string())));
        }
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map_or_else(|_| body.trim().to_string(), |e| e.error);
        let kind = match status {
            StatusCode::BAD_REQUEST => StoreErrorKind::InvalidInput(message),
            StatusCode::NOT_FOUND => StoreErrorKind::NotFound,
            _ => StoreErrorKind::Backend {
                status: status.as_u16(),
                message,
            },
        };
        Err(StoreError::new(op, label, kind))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        op: StoreOp,
        label: &str,
        build: impl Fn() -> RequestBuilder + Send + Sync,
    ) -> Result<T, StoreError> {
        self.policy
            .run(op, label, || Self::send(op, label, build()))
            .await
    }
}

impl SchemaProvider for GatewayClient {
    async fn columns(&self, table: &TableRef) -> Result<Vec<Column>, StoreError> {
        let label = table.to_string();
        let envelope: ColumnsEnvelope = self
            .call(StoreOp::Columns, &label, || {
                self.request(Method::GET, "/api/columns")
                    .query(&[("source", label.as_str())])
            })
            .await?;
        Ok(envelope.columns)
    }
}

impl RowStore for GatewayClient {
    async fn list(&self, table: &TableRef, query: &ListQuery) -> Result<ListResponse, StoreError> {
        let label = table.to_string();
        let mut pairs = vec![("source", label.clone())];
        pairs.extend(query.to_pairs());
        self.call(StoreOp::List, &label, || {
            self.request(Method::GET, "/api/rows").query(&pairs)
        })
        .await
    }

    async fn create(&self, table: &TableRef, data: Row) -> Result<Row, StoreError> {
        let label = table.to_string();
        let body = json!({ "source": label, "data": data.to_json() });
        let envelope: RowEnvelope = self
            .call(StoreOp::Create, &label, || {
                self.request(Method::POST, "/api/rows").json(&body)
            })
            .await?;
        Ok(envelope.row)
    }

    async fn update(&self, table: &TableRef, row_id: &RowId, data: Row) -> Result<Row, StoreError> {
        let label = table.to_string();
        let body = json!({ "source": label, "rowId": row_id.to_json(), "data": data.to_json() });
        let envelope: RowEnvelope = self
            .call(StoreOp::Update, &label, || {
                self.request(Method::PATCH, "/api/rows").json(&body)
            })
            .await?;
        Ok(envelope.row)
    }

    async fn delete(&self, table: &TableRef, row_id: &RowId) -> Result<(), StoreError> {
        let label = table.to_string();
        let body = json!({ "source": label, "rowId": row_id.to_json() });
        let _: Value = self
            .call(StoreOp::Delete, &label, || {
                self.request(Method::DELETE, "/api/rows").json(&body)
            })
            .await?;
        Ok(())
    }
}

impl TableLocator for GatewayClient {
    async fn find_table(&self, name: &str) -> Result<Option<LocatedTable>, StoreError> {
        let result: Result<LocatedTable, StoreError> = self
            .call(StoreOp::FindTable, name, || {
                self.request(Method::GET, "/api/tables").query(&[("name", name)])
            })
            .await;
        match result {
            Ok(found) => Ok(Some(found)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
