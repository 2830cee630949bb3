use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    AgeBracket, CoherenceReport, LabeledFigure, Product, Profile, RiskPreference, ShortlistEntry,
    SortDirection, SortKey, WorkerKind, sort_catalog,
};
use crate::error::{AppError, RequestError};
use crate::state::AppState;

/// Upper bound accepted for `maxResults`.
pub const MAX_RESULTS_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MatchPayload {
    age_bracket: Option<AgeBracket>,
    horizon_years: Option<u32>,
    risk_preference: Option<RiskPreference>,
    has_fpn: Option<bool>,
    fpn_category: Option<String>,
    worker_kind: Option<WorkerKind>,
    monthly_contribution: Option<f64>,

    max_results: Option<usize>,
    category: Option<String>,
    product_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FundsPayload {
    sort_key: Option<String>,
    direction: Option<SortDirection>,
}

#[derive(Debug, PartialEq)]
struct MatchRequest {
    profile: Profile,
    max_results: Option<usize>,
    category: Option<String>,
    product_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundRow<'a> {
    #[serde(flatten)]
    product: &'a Product,
    cost: LabeledFigure,
    return_10y: LabeledFigure,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundsResponse<'a> {
    sort_key: Option<SortKey>,
    direction: SortDirection,
    funds: Vec<FundRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortlistRow<'a> {
    rank: usize,
    #[serde(flatten)]
    entry: ShortlistEntry<'a>,
    coherence: CoherenceReport,
    cost: LabeledFigure,
    return_10y: LabeledFigure,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortlistResponse<'a> {
    profile: &'a Profile,
    max_results: usize,
    eligible_categories: Option<&'a [String]>,
    entries: Vec<ShortlistRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoherenceResponse {
    product_id: Option<String>,
    #[serde(flatten)]
    report: CoherenceReport,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/funds", get(funds_handler))
        .route(
            "/api/shortlist",
            get(shortlist_get_handler).post(shortlist_post_handler),
        )
        .route(
            "/api/coherence",
            get(coherence_get_handler).post(coherence_post_handler),
        )
        .route("/api/config", get(config_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let products = state.catalog.len();
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, products, "fund matching API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Response {
    json_response(StatusCode::OK, state.engine.config())
}

async fn funds_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Query<FundsPayload>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(payload) =
        payload.map_err(|rejection| RequestError::Malformed(rejection.body_text()))?;
    Ok(json_response(StatusCode::OK, build_funds_response(&state, payload)))
}

async fn shortlist_get_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Query<MatchPayload>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(payload) =
        payload.map_err(|rejection| RequestError::Malformed(rejection.body_text()))?;
    shortlist_handler_impl(&state, payload)
}

async fn shortlist_post_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MatchPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| RequestError::Malformed(rejection.body_text()))?;
    shortlist_handler_impl(&state, payload)
}

async fn coherence_get_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Query<MatchPayload>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(payload) =
        payload.map_err(|rejection| RequestError::Malformed(rejection.body_text()))?;
    coherence_handler_impl(&state, payload)
}

async fn coherence_post_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MatchPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| RequestError::Malformed(rejection.body_text()))?;
    coherence_handler_impl(&state, payload)
}

fn shortlist_handler_impl(state: &AppState, payload: MatchPayload) -> Result<Response, AppError> {
    let request = match_request_from_payload(payload)?;
    if request.category.is_some() || request.product_id.is_some() {
        debug!("category/productId ignored by shortlist");
    }
    let response = build_shortlist_response(state, &request);
    Ok(json_response(StatusCode::OK, response))
}

fn coherence_handler_impl(state: &AppState, payload: MatchPayload) -> Result<Response, AppError> {
    let request = match_request_from_payload(payload)?;
    let response = build_coherence_response(state, &request)?;
    Ok(json_response(StatusCode::OK, response))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

pub(crate) fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn match_request_from_json(json: &str) -> Result<MatchRequest, RequestError> {
    let payload = serde_json::from_str::<MatchPayload>(json)
        .map_err(|e| RequestError::Malformed(format!("Invalid API JSON payload: {e}")))?;
    match_request_from_payload(payload)
}

fn match_request_from_payload(payload: MatchPayload) -> Result<MatchRequest, RequestError> {
    if let Some(value) = payload.max_results {
        if value == 0 || value > MAX_RESULTS_LIMIT {
            return Err(RequestError::MaxResults {
                value,
                limit: MAX_RESULTS_LIMIT,
            });
        }
    }

    if let Some(amount) = payload.monthly_contribution {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RequestError::MonthlyContribution);
        }
    }

    let profile = Profile {
        age_bracket: payload.age_bracket,
        horizon_years: payload.horizon_years,
        risk_preference: payload.risk_preference,
        has_fpn: payload.has_fpn,
        fpn_category: payload.fpn_category,
        worker_kind: payload.worker_kind,
        monthly_contribution: payload.monthly_contribution,
    };

    Ok(MatchRequest {
        profile,
        max_results: payload.max_results,
        category: payload.category,
        product_id: payload.product_id,
    })
}

fn build_funds_response(state: &AppState, payload: FundsPayload) -> FundsResponse<'_> {
    let direction = payload.direction.unwrap_or_default();
    let sort_key = payload.sort_key.as_deref().and_then(|raw| {
        let key = SortKey::parse(raw);
        if key.is_none() {
            warn!(sort_key = raw, "unknown sort key, keeping catalog order");
        }
        key
    });

    let rows: Vec<&Product> = match sort_key {
        Some(key) => sort_catalog(state.catalog.products(), key, direction),
        None => state.catalog.products().iter().collect(),
    };

    FundsResponse {
        sort_key,
        direction,
        funds: rows
            .into_iter()
            .map(|product| FundRow {
                product,
                cost: state.engine.cost_label(product.costs.isc_35y),
                return_10y: state.engine.return_label(product.returns.last_10y),
            })
            .collect(),
    }
}

fn build_shortlist_response<'a>(
    state: &'a AppState,
    request: &'a MatchRequest,
) -> ShortlistResponse<'a> {
    let engine = &state.engine;
    let profile = &request.profile;
    let max_results = request
        .max_results
        .unwrap_or(engine.config().default_max_results);
    let entries = engine.shortlist(state.catalog.products(), profile, Some(max_results));

    ShortlistResponse {
        profile,
        max_results,
        eligible_categories: profile
            .horizon_years
            .map(|years| engine.config().eligibility.allowed_for(years)),
        entries: entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let product = entry.product;
                ShortlistRow {
                    rank: index + 1,
                    coherence: engine.explain_coherence(product.category_code(), profile),
                    cost: engine.cost_label(product.costs.isc_35y),
                    return_10y: engine.return_label(product.returns.last_10y),
                    entry,
                }
            })
            .collect(),
    }
}

fn build_coherence_response(
    state: &AppState,
    request: &MatchRequest,
) -> Result<CoherenceResponse, RequestError> {
    let category = match (&request.category, &request.product_id) {
        (Some(_), Some(_)) => return Err(RequestError::AmbiguousSubject),
        (_, Some(id)) => state
            .catalog
            .get(id)
            .ok_or_else(|| RequestError::UnknownProduct(id.clone()))?
            .category_code(),
        (category, None) => category.as_deref(),
    };

    Ok(CoherenceResponse {
        product_id: request.product_id.clone(),
        report: state.engine.explain_coherence(category, &request.profile),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, Category, MatchEngine, Tier};

    fn sample_state() -> AppState {
        AppState::new(
            MatchEngine::default(),
            Catalog::embedded().expect("embedded catalog"),
        )
    }

    #[test]
    fn match_request_from_json_parses_web_keys() {
        let json = r#"{
          "ageBracket": "35-50",
          "horizonYears": 18,
          "riskPreference": "medium",
          "hasFpn": true,
          "fpnCategory": "COMMERCIO",
          "workerKind": "employee",
          "monthlyContribution": 150,
          "maxResults": 3
        }"#;
        let request = match_request_from_json(json).expect("json should parse");

        assert_eq!(request.profile.age_bracket, Some(AgeBracket::From35To50));
        assert_eq!(request.profile.horizon_years, Some(18));
        assert_eq!(
            request.profile.risk_preference,
            Some(RiskPreference::Medium)
        );
        assert_eq!(request.profile.has_fpn, Some(true));
        assert_eq!(request.profile.fpn_category.as_deref(), Some("COMMERCIO"));
        assert_eq!(request.profile.worker_kind, Some(WorkerKind::Employee));
        assert_eq!(request.profile.monthly_contribution, Some(150.0));
        assert_eq!(request.max_results, Some(3));
    }

    #[test]
    fn match_request_accepts_empty_payload() {
        let request = match_request_from_json("{}").expect("empty payload");
        assert!(request.profile.is_empty());
        assert_eq!(request.max_results, None);
    }

    #[test]
    fn match_request_rejects_out_of_range_max_results() {
        for value in [0, MAX_RESULTS_LIMIT + 1] {
            let err = match_request_from_json(&format!(r#"{{"maxResults": {value}}}"#))
                .expect_err("must reject maxResults");
            assert_eq!(
                err,
                RequestError::MaxResults {
                    value,
                    limit: MAX_RESULTS_LIMIT
                }
            );
        }
    }

    #[test]
    fn match_request_rejects_negative_contribution() {
        let err = match_request_from_json(r#"{"monthlyContribution": -1}"#)
            .expect_err("must reject negative contribution");
        assert_eq!(err, RequestError::MonthlyContribution);
    }

    #[test]
    fn match_request_rejects_unknown_enum_value() {
        let err = match_request_from_json(r#"{"riskPreference": "extreme"}"#)
            .expect_err("must reject unknown risk preference");
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn funds_sorted_by_cost_descending_put_missing_last() {
        let state = sample_state();
        let response = build_funds_response(
            &state,
            FundsPayload {
                sort_key: Some("isc35y".to_string()),
                direction: Some(SortDirection::Desc),
            },
        );
        let ids: Vec<&str> = response
            .funds
            .iter()
            .map(|row| row.product.id.as_str())
            .collect();

        assert_eq!(response.funds.len(), state.catalog.len());
        assert_eq!(ids.first(), Some(&"pip-assicura-bilanciato"));
        assert_eq!(ids.last(), Some(&"pip-meridiana-azionario"));
        assert_eq!(response.funds[0].cost.tier, Tier::Tier3);
        assert_eq!(response.funds.last().map(|row| row.cost.tier), Some(Tier::Unavailable));
    }

    #[test]
    fn funds_with_unknown_sort_key_keep_catalog_order() {
        let state = sample_state();
        let response = build_funds_response(
            &state,
            FundsPayload {
                sort_key: Some("popularity".to_string()),
                direction: None,
            },
        );
        let expected: Vec<&str> = state
            .catalog
            .products()
            .iter()
            .map(|product| product.id.as_str())
            .collect();
        let actual: Vec<&str> = response
            .funds
            .iter()
            .map(|row| row.product.id.as_str())
            .collect();
        assert_eq!(response.sort_key, None);
        assert_eq!(actual, expected);
    }

    #[test]
    fn shortlist_response_serialization_contains_expected_fields() {
        let state = sample_state();
        let request = match_request_from_json(
            r#"{"horizonYears": 30, "riskPreference": "high", "maxResults": 2}"#,
        )
        .expect("valid request");
        let response = build_shortlist_response(&state, &request);

        assert_eq!(response.entries.len(), 2);
        assert_eq!(response.entries[0].rank, 1);
        assert!(response.entries[0].entry.score >= response.entries[1].entry.score);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"eligibleCategories\":[\"BIL\",\"AZN\"]"));
        assert!(json.contains("\"maxResults\":2"));
        assert!(json.contains("\"breakdown\""));
        assert!(json.contains("\"coherence\""));
        assert!(json.contains("\"return10y\""));
        assert!(json.contains("\"isc35y\""));
    }

    #[test]
    fn shortlist_without_horizon_is_empty() {
        let state = sample_state();
        let request = match_request_from_json(r#"{"riskPreference": "high"}"#).expect("valid");
        let response = build_shortlist_response(&state, &request);
        assert!(response.entries.is_empty());
        assert_eq!(response.eligible_categories, None);
    }

    #[test]
    fn coherence_resolves_category_from_product_id() {
        let state = sample_state();
        let request = match_request_from_json(
            r#"{"productId": "fpn-industria-bilanciato", "horizonYears": 30}"#,
        )
        .expect("valid request");
        let response = build_coherence_response(&state, &request).expect("known product");
        assert_eq!(response.report.category, Some(Category::Balanced));
        assert_eq!(response.report.score, 75);
    }

    #[test]
    fn coherence_rejects_unknown_product_and_ambiguous_subject() {
        let state = sample_state();
        let unknown = match_request_from_json(r#"{"productId": "nope"}"#).expect("valid");
        assert_eq!(
            build_coherence_response(&state, &unknown).expect_err("unknown id"),
            RequestError::UnknownProduct("nope".to_string())
        );

        let both = match_request_from_json(
            r#"{"productId": "fpn-industria-bilanciato", "category": "BIL"}"#,
        )
        .expect("valid");
        assert_eq!(
            build_coherence_response(&state, &both).expect_err("ambiguous"),
            RequestError::AmbiguousSubject
        );
    }

    #[test]
    fn coherence_for_empty_profile_is_neutral() {
        let state = sample_state();
        let request = match_request_from_json(r#"{"category": "AZN"}"#).expect("valid");
        let response = build_coherence_response(&state, &request).expect("category given");
        assert_eq!(response.report.score, 50);
        assert_eq!(response.report.ideal_risk, None);
    }
}
