use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use fundmatch::api::router;
use fundmatch::core::{Catalog, MatchEngine};
use fundmatch::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(
        MatchEngine::default(),
        Catalog::embedded().expect("embedded catalog"),
    );
    router(Arc::new(state))
}

async fn send(request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, cache_control, body)
}

async fn get(uri: &str) -> (StatusCode, Option<String>, Value) {
    send(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
}

async fn post_json(uri: &str, json: &str) -> (StatusCode, Option<String>, Value) {
    send(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request"),
    )
    .await
}

#[tokio::test]
async fn config_endpoint_returns_active_rule_set() {
    let (status, cache_control, body) = get("/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert_eq!(body["defaultMaxResults"], 5);
    assert_eq!(body["neutralCoherence"], 50);
    assert!(body["costBands"].is_object());
}

#[tokio::test]
async fn shortlist_get_reads_profile_from_query() {
    let (status, _, body) =
        get("/api/shortlist?horizonYears=30&riskPreference=high&hasFpn=false&maxResults=3").await;
    assert_eq!(status, StatusCode::OK);

    let entries = body["entries"].as_array().expect("entries array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(body["eligibleCategories"], serde_json::json!(["BIL", "AZN"]));
    for entry in entries {
        assert_ne!(entry["product"]["type"], "FPN");
        assert!(entry["coherence"]["score"].is_u64());
    }
}

#[tokio::test]
async fn shortlist_post_matches_get() {
    let (_, _, from_query) = get("/api/shortlist?horizonYears=12&ageBracket=35-50").await;
    let (status, _, from_body) = post_json(
        "/api/shortlist",
        r#"{"horizonYears": 12, "ageBracket": "35-50"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(from_query, from_body);
}

#[tokio::test]
async fn shortlist_without_horizon_is_empty() {
    let (status, _, body) = post_json("/api/shortlist", r#"{"riskPreference": "low"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], serde_json::json!([]));
    assert!(body["eligibleCategories"].is_null());
}

#[tokio::test]
async fn shortlist_rejects_max_results_out_of_range() {
    let (status, cache_control, body) =
        post_json("/api/shortlist", r#"{"horizonYears": 20, "maxResults": 0}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("maxResults")
    );
}

#[tokio::test]
async fn malformed_requests_are_json_400s() {
    let (status, _, body) = get("/api/shortlist?horizonYears=soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, body) = post_json("/api/coherence", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn coherence_explains_score() {
    let (status, _, body) = get("/api/coherence?category=BIL&horizonYears=30").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 75);
    assert_eq!(body["category"], "BIL");
    assert_eq!(body["label"]["tier"], "tier1");
    assert_eq!(body["idealRisk"]["source"]["kind"], "horizonRule");
}

#[tokio::test]
async fn coherence_for_unknown_product_is_404() {
    let (status, _, body) = get("/api/coherence?productId=missing&horizonYears=10").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown product id 'missing'");
}

#[tokio::test]
async fn funds_sorted_by_cost_keep_missing_values_last() {
    for direction in ["asc", "desc"] {
        let (status, _, body) = get(&format!("/api/funds?sortKey=isc35y&direction={direction}")).await;
        assert_eq!(status, StatusCode::OK);
        let funds = body["funds"].as_array().expect("funds array");
        let last = funds.last().expect("catalog is not empty");
        assert!(last["costs"]["isc35y"].is_null());
        assert_eq!(last["cost"]["tier"], "unavailable");
    }
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let (status, cache_control, body) = get("/api/simulate").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(cache_control.as_deref(), Some("no-store"));
    assert_eq!(body["error"], "Not found");
}
