// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP proxy in front of a Tabula store.
//!
//! Routes:
//!
//! - `GET|POST|PATCH|DELETE /api/rows`: paginated list and single-row
//!   mutations, each addressed by a `source` of the form `baseId.tableId`.
//! - `GET /api/columns?source=`: column metadata.
//! - `GET /api/tables?name=`: resolve a table by title or internal name.
//! - `GET /healthz`: liveness.
//!
//! Parameters are validated before the store is touched; a rejected request
//! never reaches the backend. Failures answer `{"error": message}`.
#![forbid(unsafe_code)]

pub mod demo;
mod error;

pub use error::ApiError;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tabula_model::{CellValue, ListQuery, Row, RowId, TableRef};
use tabula_store::{RowStore, SchemaProvider, TableLocator};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared handler state.
pub struct AppState<S> {
    /// Backend every route talks to.
    pub store: S,
    /// Page size applied when a list request carries no `limit`.
    pub default_limit: Option<u32>,
}

impl<S> AppState<S> {
    /// State over `store` with no default page size.
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_limit: None,
        }
    }

    /// Apply `limit` to list requests that omit one.
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = Some(limit);
        self
    }
}

/// Bound every gateway backend satisfies.
pub trait GatewayStore: RowStore + SchemaProvider + TableLocator + Send + Sync + 'static {}

impl<S> GatewayStore for S where
    S: RowStore + SchemaProvider + TableLocator + Send + Sync + 'static
{
}

/// Router over `state` with request tracing.
pub fn router<S: GatewayStore>(state: AppState<S>) -> Router {
    Router::new()
        .route(
            "/api/rows",
            get(list_rows::<S>)
                .post(create_row::<S>)
                .patch(update_row::<S>)
                .delete(delete_row::<S>),
        )
        .route("/api/columns", get(list_columns::<S>))
        .route("/api/tables", get(find_table::<S>))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

type Shared<S> = State<Arc<AppState<S>>>;

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    source: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    #[serde(rename = "where")]
    where_clause: Option<String>,
    sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceParams {
    source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NameParams {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MutationBody {
    source: Option<String>,
    #[serde(rename = "rowId")]
    row_id: Option<Value>,
    data: Option<Row>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_count(name: &str, raw: Option<String>) -> Result<Option<u32>, ApiError> {
    present(raw)
        .map(|v| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| ApiError::BadRequest(format!("{name} must be a non-negative integer")))
        })
        .transpose()
}

// A null, empty, boolean, or structured id counts as missing.
fn row_id(value: Option<Value>) -> Option<RowId> {
    value.and_then(|v| RowId::from_cell(&CellValue::from(v)))
}

fn body(payload: Result<Json<MutationBody>, JsonRejection>) -> Result<MutationBody, ApiError> {
    Ok(payload?.0)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_rows<S: GatewayStore>(
    State(state): Shared<S>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let Some(source) = present(params.source) else {
        return Err(ApiError::BadRequest("Source parameter is required".into()));
    };
    let table = TableRef::parse(&source)?;
    let query = ListQuery {
        limit: parse_count("limit", params.limit)?.or(state.default_limit),
        offset: parse_count("offset", params.offset)?,
        where_clause: present(params.where_clause),
        sort: present(params.sort),
    };
    let page = state.store.list(&table, &query).await?;
    debug!(table = %table, rows = page.list.len(), "rows listed");
    Ok(Json(page).into_response())
}

async fn create_row<S: GatewayStore>(
    State(state): Shared<S>,
    payload: Result<Json<MutationBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = body(payload)?;
    let (Some(source), Some(data)) = (present(body.source), body.data) else {
        return Err(ApiError::BadRequest("Source and data parameters are required".into()));
    };
    let table = TableRef::parse(&source)?;
    let row = state.store.create(&table, data).await?;
    info!(table = %table, "row created");
    Ok((StatusCode::CREATED, Json(json!({ "row": row }))).into_response())
}

async fn update_row<S: GatewayStore>(
    State(state): Shared<S>,
    payload: Result<Json<MutationBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = body(payload)?;
    let (Some(source), Some(id), Some(data)) =
        (present(body.source), row_id(body.row_id), body.data)
    else {
        return Err(ApiError::BadRequest(
            "Source, rowId, and data parameters are required".into(),
        ));
    };
    let table = TableRef::parse(&source)?;
    let row = state.store.update(&table, &id, data).await?;
    info!(table = %table, row_id = %id, "row updated");
    Ok(Json(json!({ "row": row })).into_response())
}

async fn delete_row<S: GatewayStore>(
    State(state): Shared<S>,
    payload: Result<Json<MutationBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = body(payload)?;
    let (Some(source), Some(id)) = (present(body.source), row_id(body.row_id)) else {
        return Err(ApiError::BadRequest(
            "Source and rowId parameters are required".into(),
        ));
    };
    let table = TableRef::parse(&source)?;
    state.store.delete(&table, &id).await?;
    info!(table = %table, row_id = %id, "row deleted");
    Ok(Json(json!({ "success": true })).into_response())
}

async fn list_columns<S: GatewayStore>(
    State(state): Shared<S>,
    Query(params): Query<SourceParams>,
) -> Result<Response, ApiError> {
    let Some(source) = present(params.source) else {
        return Err(ApiError::BadRequest("Source parameter is required".into()));
    };
    let table = TableRef::parse(&source)?;
    let columns = state.store.columns(&table).await?;
    Ok(Json(json!({ "columns": columns })).into_response())
}

async fn find_table<S: GatewayStore>(
    State(state): Shared<S>,
    Query(params): Query<NameParams>,
) -> Result<Response, ApiError> {
    let Some(name) = present(params.name) else {
        return Err(ApiError::BadRequest("Name parameter is required".into()));
    };
    let name = name.trim();
    match state.store.find_table(name).await? {
        Some(found) => Ok(Json(json!({
            "table": found.table,
            "baseId": found.base_id,
            "source": found.source(),
        }))
        .into_response()),
        None => Err(ApiError::NotFound(format!("Table \"{name}\" not found"))),
    }
}
