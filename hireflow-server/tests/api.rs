//! End-to-end API tests against a live database.
//!
//! Run with: HIREFLOW_DB_HOST=... cargo test -p hireflow-server -- --ignored

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use hireflow_db::{Db, DbConfig};
use hireflow_server::{build_router, migrations, AppState, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let config = DbConfig::default().apply_env().expect("valid test config");
    let db = Db::connect(config).await.expect("connect");
    migrations::run(&db).await.expect("migrations");
    build_router(AppState::new(db), &ServerConfig::default())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
#[ignore = "requires database"]
async fn dashboard_columns_keep_their_order() {
    let app = app().await;

    let (status, dashboard) = post(
        &app,
        "/dashboard/create",
        json!({"name": "Backend", "columns": ["Screening", "Interview", "Offer"]}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dashboard["columns"].as_array().unwrap().len(), 3);

    let (status, columns) = post(
        &app,
        "/dashboard/processes",
        json!({"dashboardId": dashboard["id"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = columns
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Screening", "Interview", "Offer"]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn applying_a_candidate_places_it_on_the_first_column() {
    let app = app().await;

    let (_, dashboard) = post(
        &app,
        "/dashboard/create",
        json!({"name": "Frontend", "columns": ["New", "Done"]}),
    )
    .await;
    let (status, created) = post(&app, "/candidates/create", json!({"name": "Ada"})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, outcome) = post(
        &app,
        "/candidates/apply",
        json!({"candidateId": created["id"], "dashboardId": dashboard["id"]}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["column"], dashboard["columns"][0]["id"]);

    let (_, in_process) = post(&app, "/candidates/in-process/list", json!({})).await;
    assert!(in_process
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["id"] == created["id"]));

    let (_, history) = post(&app, "/dashboard/history", json!({"taskId": outcome["task"]})).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_candidate_is_404_and_dangling_reference_is_409() {
    let app = app().await;
    let missing = uuid::Uuid::new_v4();

    let (status, body) = post(&app, "/candidates/get", json!({"id": missing})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = post(
        &app,
        "/dashboard/history-append",
        json!({"taskId": missing, "columnId": missing}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires database"]
async fn migrations_are_idempotent() {
    let config = DbConfig::default().apply_env().expect("valid test config");
    let db = Db::connect(config).await.expect("connect");
    migrations::run(&db).await.expect("first run");
    let report = migrations::run(&db).await.expect("second run");
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, migrations::MIGRATIONS.len());
}
