// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Real sockets: `GatewayClient` against the gateway, and the gateway
//! against a stub NocoDB.
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tabula_dry_tests::fixtures;
use tabula_gateway::{router, AppState};
use tabula_model::{CellValue, ListQuery, Row, RowId, TableRef};
use tabula_store::{
    GatewayClient, NocoClient, RetryPolicy, RowStore, SchemaProvider, StoreErrorKind, StoreOp,
    TableLocator,
};
use tower::ServiceExt;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

fn policy() -> RetryPolicy {
    RetryPolicy::no_retry(Duration::from_secs(5))
}

fn named(name: &str) -> Row {
    [("name", name)].into_iter().collect()
}

#[tokio::test]
async fn gateway_client_speaks_the_gateway_contract() {
    let (store, source) = fixtures::seeded_tasks(2);
    let url = spawn(router(AppState::new(store.clone()))).await;
    let client = GatewayClient::new(url, policy());

    let columns = client.columns(&source).await.unwrap();
    assert_eq!(columns, fixtures::task_columns());

    let created = client.create(&source, named("Task 3")).await.unwrap();
    assert_eq!(created.get("Id"), Some(&CellValue::from(3_i64)));
    let updated = client
        .update(&source, &RowId::Int(3), named("Third"))
        .await
        .unwrap();
    assert_eq!(updated.get("name").and_then(CellValue::as_text), Some("Third"));
    client.delete(&source, &RowId::Int(1)).await.unwrap();

    let page = client.list(&source, &ListQuery::limit(10)).await.unwrap();
    let names: Vec<_> = page
        .list
        .iter()
        .filter_map(|r| r.get("name").and_then(CellValue::as_text))
        .collect();
    assert_eq!(names, ["Task 2", "Third"]);
    assert_eq!(page.page_info.is_last_page, Some(true));

    let located = client.find_table("tasks").await.unwrap().unwrap();
    assert_eq!(located.source(), source);
    assert!(client.find_table("nope").await.unwrap().is_none());

    let err = client.create(&source, named("")).await.unwrap_err();
    assert_eq!(err.kind, StoreErrorKind::InvalidInput("Name is required".into()));

    store.fail(StoreOp::Delete);
    let err = client.delete(&source, &RowId::Int(2)).await.unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::Backend { status: 500, .. }));
    assert_eq!(err.summary(), "simulated delete failure");
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("xc-token").and_then(|v| v.to_str().ok()) == Some("secret")
}

fn stub_nocodb() -> Router {
    Router::new()
        .route(
            "/api/v2/meta/bases",
            get(|| async { Json(json!({ "list": [{ "id": "p1", "title": "Demo" }] })) }),
        )
        .route(
            "/api/v2/meta/bases/{base}/tables",
            get(|Path(base): Path<String>| async move {
                assert_eq!(base, "p1");
                Json(json!({ "list": [{ "id": "t2", "title": "Tasks", "table_name": "tasks" }] }))
            }),
        )
        .route(
            "/api/v2/tables/{table}/records",
            get(|headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "bad token" })));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "list": [{ "Id": 1, "name": "A" }],
                        "pageInfo": { "totalRows": 1, "isLastPage": true }
                    })),
                )
            })
            .post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert!(authorized(&headers));
                assert_eq!(body, json!({ "name": "X" }));
                Json(json!({ "Id": 7 }))
            })
            .patch(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert!(authorized(&headers));
                if body["Id"] != json!(7) {
                    return (StatusCode::NOT_FOUND, Json(json!({ "msg": "Record not found" })));
                }
                assert_eq!(body, json!({ "Id": 7, "name": "Y" }));
                (StatusCode::OK, Json(json!({ "Id": 7 })))
            })
            .delete(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert!(authorized(&headers));
                if body != json!({ "Id": 7 }) {
                    return (StatusCode::NOT_FOUND, Json(json!({ "msg": "Record not found" })));
                }
                (StatusCode::OK, Json(json!({ "Id": 7 })))
            }),
        )
        .route(
            "/api/v2/tables/{table}/records/{id}",
            get(|Path((_, id)): Path<(String, i64)>| async move {
                Json(json!({ "Id": id, "name": "X", "done": false }))
            }),
        )
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn gateway_proxies_to_nocodb() {
    let noco = spawn(stub_nocodb()).await;
    let client = NocoClient::new(noco.clone(), Some("secret".into()), policy());
    let app = router(AppState::new(client));

    let (status, body) = call(app.clone(), "GET", "/api/rows?source=p1.t2&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["list"][0]["name"], json!("A"));
    assert_eq!(body["pageInfo"]["isLastPage"], json!(true));

    let create = json!({ "source": "p1.t2", "data": { "name": "X" } });
    let (status, body) = call(app.clone(), "POST", "/api/rows", Some(create)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["row"], json!({ "Id": 7, "name": "X", "done": false }));

    let (status, body) = call(app, "GET", "/api/tables?name=Tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], json!("p1.t2"));

    let anonymous = router(AppState::new(NocoClient::new(noco, None, policy())));
    let (status, body) = call(anonymous, "GET", "/api/rows?source=p1.t2", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("bad token"));
}

#[tokio::test]
async fn nocodb_updates_and_deletes_by_primary_key() {
    let noco = spawn(stub_nocodb()).await;
    let client = NocoClient::new(noco, Some("secret".into()), policy());
    let source = TableRef::parse("p1.t2").unwrap();

    let row = client.update(&source, &RowId::Int(7), named("Y")).await.unwrap();
    assert_eq!(row.get("Id"), Some(&CellValue::from(7_i64)));
    client.delete(&source, &RowId::Int(7)).await.unwrap();

    let err = client
        .update(&source, &RowId::Int(99), named("Y"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.op, StoreOp::Update);
    assert_eq!(err.summary(), "Record not found");
    let err = client.delete(&source, &RowId::Int(99)).await.unwrap_err();
    assert!(err.is_not_found());

    let app = router(AppState::new(client));
    let patch = json!({ "source": "p1.t2", "rowId": 99, "data": { "name": "Y" } });
    let (status, body) = call(app.clone(), "PATCH", "/api/rows", Some(patch)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Record not found"));

    let delete = json!({ "source": "p1.t2", "rowId": 7 });
    let (status, body) = call(app, "DELETE", "/api/rows", Some(delete)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
}
