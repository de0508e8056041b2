// Cycle Tracker - REST API with Axum
// Stateless: every request carries its own period history and gets a fresh predictor

use crate::clock::Clock;
use crate::config::PredictionConfig;
use crate::period::{PeriodHistory, DATE_FORMAT};
use crate::predictor::{CyclePredictor, PredictionStrategy};
use crate::report::CycleReport;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Shared application state (read-only)
#[derive(Clone)]
pub struct AppState {
    pub prediction: PredictionConfig,
    pub clock: Arc<dyn Clock>,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// One form row; blank or missing dates mean the row is incomplete
#[derive(Debug, Deserialize)]
pub struct PeriodInput {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub periods: Vec<PeriodInput>,
    #[serde(default)]
    pub as_of: Option<String>,
    #[serde(default)]
    pub strategy: Option<PredictionStrategy>,
}

fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .map(Some)
            .map_err(|_| format!("Invalid {} date (expected YYYY-MM-DD): {}", field, v)),
    }
}

fn history_from_request(req: &PredictRequest) -> Result<PeriodHistory, String> {
    let mut pairs = Vec::with_capacity(req.periods.len());
    for (i, row) in req.periods.iter().enumerate() {
        let start = parse_optional_date(&format!("period #{} start", i + 1), row.start.as_deref())?;
        let end = parse_optional_date(&format!("period #{} end", i + 1), row.end.as_deref())?;
        pairs.push((start, end));
    }
    Ok(PeriodHistory::from_optional_pairs(pairs))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/predict - Full cycle report for the submitted periods
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    // Body errors come back in the same envelope as date errors
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(status = %rejection.status(), "rejected predict body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ApiResponse::<CycleReport>::err(rejection.body_text())),
            )
                .into_response();
        }
    };

    let history = match history_from_request(&req) {
        Ok(history) => history,
        Err(message) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::<CycleReport>::err(message)),
            )
                .into_response()
        }
    };

    let as_of = match parse_optional_date("as_of", req.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(message) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::<CycleReport>::err(message)),
            )
                .into_response()
        }
    };

    let mut predictor = state
        .prediction
        .apply(CyclePredictor::from_history(history))
        .with_clock(state.clock.clone());
    if let Some(strategy) = req.strategy {
        predictor = predictor.with_strategy(strategy);
    }

    let report = CycleReport::build(&predictor, as_of);
    (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
}

/// GET / - Serve the entry form
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    info!(strategy = state.prediction.strategy.name(), "building API router");

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================
