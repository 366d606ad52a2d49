use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use deconflict_core::{ConflictClassifier, ConstantClassifier, DeconflictionRules};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, api::request_id::REQUEST_ID_HEADER, state::AppState};

fn setup_app(classifier: Option<Box<dyn ConflictClassifier>>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(DeconflictionRules::default(), classifier).expect("state"));
    let app = api::routes().with_state(state.clone());
    (app, state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn mission(id: &str, from: [f64; 3], to: [f64; 3]) -> Value {
    json!({
        "id": id,
        "waypoints": [
            {"x": from[0], "y": from[1], "z": from[2]},
            {"x": to[0], "y": to[1], "z": to[2]}
        ],
        "timeWindow": {"start": 0, "end": 100}
    })
}

fn crossing_request() -> Value {
    json!({
        "primary": mission("PRIMARY", [0.0, 0.0, 50.0], [150.0, 0.0, 50.0]),
        "others": [
            mission("CROSSER", [75.0, -300.0, 50.0], [75.0, 300.0, 50.0]),
            mission("HIGH", [0.0, 0.0, 150.0], [150.0, 0.0, 150.0])
        ]
    })
}

#[tokio::test]
async fn health_endpoints() {
    let (app, _state) = setup_app(None);

    let res = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");

    let res = app.oneshot(get("/v1/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["mlAvailable"], false);
    assert_eq!(body["geometricAvailable"], true);
}

#[tokio::test]
async fn verify_reports_crossing_conflict() {
    let (app, _state) = setup_app(None);

    let res = app
        .oneshot(post_json("/v1/verify", crossing_request()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;

    assert_eq!(body["status"], "CONFLICT");
    assert_eq!(body["safetyBuffer"], 15.0);
    assert_eq!(body["mlUsed"], false);
    assert!(body.get("mlStats").is_none());
    assert!(body.get("screening").is_none());

    let conflicts = body["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["otherDroneId"], "CROSSER");
    assert!(conflicts[0]["distance"].as_f64().unwrap() < 15.0);
    assert_eq!(conflicts[0]["location"]["z"], 50.0);
}

#[tokio::test]
async fn verify_with_empty_traffic_is_clear() {
    let (app, _state) = setup_app(None);
    let request = json!({
        "primary": mission("PRIMARY", [0.0, 0.0, 50.0], [150.0, 0.0, 50.0]),
    });

    let res = app.oneshot(post_json("/v1/verify", request)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["status"], "CLEAR");
    assert!(body["conflicts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn verify_screens_through_classifier() {
    let (app, state) = setup_app(Some(Box::new(ConstantClassifier(0.5))));

    let res = app
        .clone()
        .oneshot(post_json("/v1/verify", crossing_request()))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["mlUsed"], true);
    assert_eq!(body["status"], "CONFLICT");
    assert_eq!(body["screening"]["candidates"], 2);
    assert_eq!(body["screening"]["checked"], 2);
    assert_eq!(body["mlStats"]["checked"], 2);
    assert_eq!(body["mlStats"]["filtered"], 0);

    let mut opted_out = crossing_request();
    opted_out["useML"] = json!(false);
    let res = app.oneshot(post_json("/v1/verify", opted_out)).await.unwrap();
    let body = read_json(res).await;
    assert_eq!(body["mlUsed"], false);
    assert_eq!(state.pipeline().stats().total_checks, 1);
}

#[tokio::test]
async fn verify_rejects_invalid_mission() {
    let (app, _state) = setup_app(None);
    let request = json!({
        "primary": {
            "id": "BROKEN",
            "waypoints": [{"x": 0, "y": 0, "z": 50}],
            "timeWindow": {"start": 0, "end": 100}
        },
        "others": []
    });

    let res = app.oneshot(post_json("/v1/verify", request)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = read_json(res).await;
    assert_eq!(body["status"], "ERROR");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("at least 2 waypoints"));
}

#[tokio::test]
async fn verify_rejects_malformed_json() {
    let (app, _state) = setup_app(None);
    let req = Request::builder()
        .method("POST")
        .uri("/v1/verify")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["status"], "ERROR");
}

#[tokio::test]
async fn trajectory_samples_mission() {
    let (app, _state) = setup_app(None);
    let request = json!({
        "mission": mission("PRIMARY", [0.0, 0.0, 50.0], [100.0, 0.0, 50.0]),
        "numSamples": 5
    });

    let res = app
        .clone()
        .oneshot(post_json("/v1/trajectory", request))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["missionId"], "PRIMARY");
    let points = body["trajectory"].as_array().unwrap();
    assert_eq!(points.len(), 5);
    assert_eq!(points[0]["time"], 0.0);
    assert_eq!(points[2]["position"]["x"], 50.0);
    assert_eq!(points[4]["time"], 100.0);

    let default_count = json!({"mission": mission("P", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0])});
    let res = app
        .clone()
        .oneshot(post_json("/v1/trajectory", default_count))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["trajectory"].as_array().unwrap().len(), 100);

    let zero = json!({"mission": mission("P", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]), "numSamples": 0});
    let res = app.oneshot(post_json("/v1/trajectory", zero)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scenarios_are_listed() {
    let (app, _state) = setup_app(None);

    let res = app.oneshot(get("/v1/scenarios")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["conflict"]["primary"]["id"], "PRIMARY");
    assert_eq!(body["clear"]["others"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn ml_stats_require_classifier() {
    let (app, _state) = setup_app(None);

    let res = app.clone().oneshot(get("/v1/ml-stats")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .oneshot(post_json("/v1/ml-stats/reset", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ml_stats_accumulate_and_reset() {
    let (app, _state) = setup_app(Some(Box::new(ConstantClassifier(0.1))));

    app.clone()
        .oneshot(post_json("/v1/verify", crossing_request()))
        .await
        .unwrap();

    let res = app.clone().oneshot(get("/v1/ml-stats")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["totalChecks"], 1);
    assert_eq!(body["mlFiltered"], 2);
    assert_eq!(body["geometricChecks"], 0);
    assert_eq!(body["filterRate"], 1.0);
    assert_eq!(body["threshold"], 0.2);

    let res = app
        .clone()
        .oneshot(post_json("/v1/ml-stats/reset", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body = read_json(app.oneshot(get("/v1/ml-stats")).await.unwrap()).await;
    assert_eq!(body["totalChecks"], 0);
    assert_eq!(body["filterRate"], 0.0);
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let (app, _state) = setup_app(None);

    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.headers()[&REQUEST_ID_HEADER], "trace-123");

    let res = app.oneshot(get("/health")).await.unwrap();
    let generated = res.headers()[&REQUEST_ID_HEADER].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}
