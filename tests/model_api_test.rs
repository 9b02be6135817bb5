// ==========================================
// HTTP 路由集成测试
// ==========================================
// 测试目标: 路由挂载、状态码、响应体与错误负载
// 工具: tower::ServiceExt::oneshot (不监听端口)
// ==========================================

mod test_helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ml_tracking::app::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{
    count_rows, create_test_db, create_test_state, seed_rows, test_config, three_partition_rows,
    FixtureRow,
};

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn app_with_data(prefix: &str) -> (tempfile::NamedTempFile, Router) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_rows(&db_path, &three_partition_rows()).unwrap();
    let state = create_test_state(&db_path).unwrap();
    (temp_file, build_router(state, prefix))
}

#[tokio::test]
async fn test_get_model_reports_default() {
    let (_temp_file, app) = app_with_data("/model");

    let (status, body) = send(&app, "GET", "/model", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "RandomForest", "message": "ML model"}));

    let (status, body) = send(&app, "GET", "/model/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"], json!(["RandomForest", "SVC", "LogisticRegression"]));
    assert_eq!(body["active"], "RandomForest");
}

#[tokio::test]
async fn test_score_flow() {
    let (_temp_file, app) = app_with_data("/model");

    // 训练前评分
    let (status, body) = send(&app, "POST", "/model", Some(r#"{"dataset": "testing"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NOT_FITTED");

    let (status, body) = send(
        &app,
        "POST",
        "/model/set_model",
        Some(r#"{"model_name": "LogisticRegression", "hyperparameters": {"C": 1.0}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Model successfully uploaded");

    let (status, body) = send(&app, "POST", "/model", Some(r#"{"dataset": "training"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Score on training set: 100.0%");

    let (status, body) = send(&app, "POST", "/model", Some(r#"{"dataset": "production"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Score on production set: 0.0%");

    let (status, body) = send(&app, "GET", "/model/runs?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["partition"], "production");
    assert_eq!(body[0]["model_name"], "LogisticRegression");

    let (status, body) = send(&app, "GET", "/model/predictions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_set_model_errors() {
    let (_temp_file, app) = app_with_data("/model");

    let (status, body) = send(
        &app,
        "POST",
        "/model/set_model",
        Some(r#"{"model_name": "NotARealModel", "hyperparameters": {}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Model not Found");
    assert_eq!(
        body["message"],
        "Please Specify 'RandomForest', 'SVC' or 'LogisticRegression'"
    );

    let (status, body) = send(&app, "POST", "/model/set_model", Some(r#"{"hyperparameters": {}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");
    assert_eq!(body["error"], "Missing parameter: model_name");

    let (status, body) = send(
        &app,
        "POST",
        "/model/set_model",
        Some(r#"{"model_name": "SVC", "hyperparameters": {"C": 0}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_HYPERPARAMETERS");
    assert_eq!(body["message"], "Invalid value provided");

    // 失败的切换不影响激活模型
    let (_, body) = send(&app, "GET", "/model", None).await;
    assert_eq!(body["name"], "RandomForest");

    // hyperparameters 省略时视为 {}
    let (status, _) = send(&app, "POST", "/model/set_model", Some(r#"{"model_name": "SVC"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/model", None).await;
    assert_eq!(body["name"], "SVC");
}

#[tokio::test]
async fn test_malformed_requests() {
    let (_temp_file, app) = app_with_data("/model");

    let (status, body) = send(&app, "POST", "/model", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = send(&app, "POST", "/model", Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_REQUIRED_FIELD");

    let (status, body) = send(&app, "POST", "/model", Some(r#"{"dataset": "validation"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = send(&app, "GET", "/model/runs?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_routes_follow_prefix() {
    let (_temp_file, app) = app_with_data("/api/v1/model");
    let (status, _) = send(&app, "GET", "/api/v1/model", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/model", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_temp_file, app) = app_with_data("");
    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ML model");
}

#[tokio::test]
async fn test_timed_out_run_is_cancelled() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let rows: Vec<FixtureRow> = (0..2000i64)
        .map(|i| {
            let x = (i % 97) as f64 / 97.0;
            let y = (i % 89) as f64 / 89.0;
            (1, i + 1, vec![x, y], Some(i64::from(x + y > 1.0)))
        })
        .collect();
    seed_rows(&db_path, &rows).unwrap();

    let config = ml_tracking::config::AppConfig {
        request_timeout_secs: 0,
        ..test_config(&db_path)
    };
    let state = Arc::new(AppState::new(&config).unwrap());
    let app = build_router(state.clone(), "/model");

    let (status, body) = send(&app, "POST", "/model", Some(r#"{"dataset": "training"}"#)).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "TIMEOUT");

    // 后台运行结束后释放其持有的 ModelApi
    let deadline = std::time::Instant::now() + Duration::from_secs(60);
    while Arc::strong_count(&state.model_api) > 1 {
        assert!(std::time::Instant::now() < deadline, "后台评分运行未退出");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(count_rows(&db_path, "predictions").unwrap(), 0);
    assert_eq!(count_rows(&db_path, "scoring_runs").unwrap(), 0);
    assert!(state.pipeline.slot().artifact().unwrap().is_none());
}
