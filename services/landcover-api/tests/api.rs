//! Router-level tests against fixture rasters.

use std::sync::Arc;

use analysis::AnalysisConfig;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use landcover_api::config::ServiceConfig;
use landcover_api::routes::router;
use landcover_api::state::AppState;
use landcover_common::Catalog;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use test_utils::{landcover_dir, quadrant_grid, LandcoverDir};
use tower::ServiceExt;

fn app(dir: &LandcoverDir) -> Router {
    let config = ServiceConfig {
        data_dir: dir.path().to_path_buf(),
        catalog_path: None,
        analysis: AnalysisConfig::default(),
        summarizer: None,
    };
    let state = Arc::new(AppState::with_catalog(&config, Arc::new(Catalog::builtin())));
    let prometheus = PrometheusBuilder::new().build_recorder().handle();
    router(state, prometheus)
}

async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::post("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn chat_returns_images_and_captions() {
    let dir = landcover_dir(12, 12, &[(2015, quadrant_grid(12, 12, [10, 12, 10, 5]))]);
    let (status, body) = post_chat(
        app(&dir),
        json!({
            "analysisType": "trend_analysis",
            "variable": ["grasslands"],
            "years": ["2015"],
            "comments": ""
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["captions"][0],
        "Trend of grasslands over the selected years."
    );
    assert_eq!(body["details"][0]["kind"], "line_chart");
    assert!(body["text"].as_str().unwrap().contains("In 2015, Grasslands covered 18.00 km²"));
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn chat_validation_message_is_200() {
    let dir = LandcoverDir::new().unwrap();
    let (status, body) = post_chat(
        app(&dir),
        json!({"analysisType": "trend_analysis", "variable": [], "years": [2015]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Please select at least one variable.");
    assert_eq!(body["images"].as_array().unwrap().len(), 0);

    let (_, body) = post_chat(
        app(&dir),
        json!({"analysisType": "comparison", "variable": "croplands", "years": [2013, 2014, 2015]}),
    )
    .await;
    assert_eq!(body["text"], "Please select one or two years.");
}

#[tokio::test]
async fn chat_rejects_malformed_body() {
    let dir = LandcoverDir::new().unwrap();
    let request = Request::post("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(&dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_config_lists_options() {
    let dir = LandcoverDir::new().unwrap();
    let response = app(&dir)
        .oneshot(Request::get("/get_config").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    let variables = body["variables"].as_array().unwrap();
    assert_eq!(variables.len(), 16);
    assert!(variables.iter().any(|v| v["value"] == "croplands"));
    assert_eq!(body["analysis_types"].as_array().unwrap().len(), 5);
    assert_eq!(body["analysis_types"][0]["value"], "trend_analysis");
    assert_eq!(body["years"][0], 2011);
}

#[tokio::test]
async fn ready_reflects_data_dir() {
    let dir = LandcoverDir::new().unwrap();
    let response = app(&dir)
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let config = ServiceConfig {
        data_dir: dir.path().join("absent"),
        catalog_path: None,
        analysis: AnalysisConfig::default(),
        summarizer: None,
    };
    let state = Arc::new(AppState::with_catalog(&config, Arc::new(Catalog::builtin())));
    let app = router(state, PrometheusBuilder::new().build_recorder().handle());
    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
