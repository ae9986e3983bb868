use crate::infra::{ApiServices, AppState};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use dropout_forecast::analytics::{round2, DepartmentAnalytics, HistoricalTrend, NationalAnalytics};
use dropout_forecast::error::AppError;
use dropout_forecast::features::{FeatureName, FeatureVector};
use dropout_forecast::forecast::{FeatureSummary, ForecastError, Overrides};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub(crate) struct PredictionRequest {
    pub(crate) municipality_name: String,
    #[serde(default)]
    pub(crate) target_year: Option<i32>,
    #[serde(default)]
    pub(crate) scenario_adjustments: Option<Overrides>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictionResponse {
    pub(crate) municipality_name: String,
    pub(crate) predicted_dropout_rate: f64,
    pub(crate) predicted_students_impacted: u64,
    pub(crate) target_year: i32,
    pub(crate) input_parameters: FeatureVector,
    pub(crate) department_code: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeaturesResponse {
    pub(crate) municipality_name: String,
    pub(crate) department_code: i64,
    pub(crate) latest_year: i32,
    pub(crate) features: Vec<FeatureSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendsQuery {
    pub(crate) department_code: Option<i64>,
}

pub(crate) fn api_router(services: ApiServices) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/predict", post(predict_endpoint))
        .route("/api/v1/municipalities", get(municipalities_endpoint))
        .route(
            "/api/v1/municipalities/:name/features",
            get(features_endpoint),
        )
        .route("/api/v1/departments", get(departments_endpoint))
        .route("/api/v1/model/features", get(model_features_endpoint))
        .route("/api/v1/analytics/national", get(national_endpoint))
        .route("/api/v1/analytics/departments", get(department_analytics_endpoint))
        .route("/api/v1/analytics/trends", get(trends_endpoint))
        .with_state(services)
}

pub(crate) async fn healthcheck(State(services): State<ApiServices>) -> impl IntoResponse {
    Json(services.forecasts.health())
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn predict_endpoint(
    State(services): State<ApiServices>,
    Json(payload): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, AppError> {
    let PredictionRequest {
        municipality_name,
        target_year,
        scenario_adjustments,
    } = payload;

    let target_year = target_year.unwrap_or(services.default_target_year);
    let overrides = scenario_adjustments.unwrap_or_default();
    let prediction = services
        .forecasts
        .predict(&municipality_name, target_year, &overrides)?;

    Ok(Json(PredictionResponse {
        municipality_name: prediction.entity_name,
        predicted_dropout_rate: round2(prediction.predicted_rate),
        predicted_students_impacted: prediction.predicted_students_impacted,
        target_year: prediction.target_year,
        input_parameters: prediction.features,
        department_code: prediction.department_code,
    }))
}

pub(crate) async fn municipalities_endpoint(State(services): State<ApiServices>) -> impl IntoResponse {
    let municipalities = services.forecasts.municipalities();
    let count = municipalities.len();
    Json(json!({ "municipalities": municipalities, "count": count }))
}

pub(crate) async fn features_endpoint(
    State(services): State<ApiServices>,
    Path(name): Path<String>,
) -> Result<Json<FeaturesResponse>, AppError> {
    let snapshot = services.forecasts.features(&name)?;
    Ok(Json(FeaturesResponse {
        municipality_name: snapshot.entity_name,
        department_code: snapshot.department_code,
        latest_year: snapshot.latest_year,
        features: snapshot.features,
    }))
}

pub(crate) async fn departments_endpoint(State(services): State<ApiServices>) -> impl IntoResponse {
    let departments = services.forecasts.departments();
    let total = departments.len();
    Json(json!({ "departments": departments, "total_departments": total }))
}

pub(crate) async fn model_features_endpoint(
    State(services): State<ApiServices>,
) -> Result<impl IntoResponse, AppError> {
    if !services.forecasts.is_model_loaded() {
        return Err(ForecastError::ModelUnavailable.into());
    }
    let descriptions: BTreeMap<&str, &str> = FeatureName::ordered()
        .into_iter()
        .map(|name| (name.key(), name.description()))
        .collect();
    Ok(Json(json!({
        "features": services.forecasts.model_features(),
        "descriptions": descriptions,
    })))
}

pub(crate) async fn national_endpoint(State(services): State<ApiServices>) -> Json<NationalAnalytics> {
    Json(services.analytics.national())
}

pub(crate) async fn department_analytics_endpoint(
    State(services): State<ApiServices>,
) -> Json<Vec<DepartmentAnalytics>> {
    Json(services.analytics.departments())
}

pub(crate) async fn trends_endpoint(
    State(services): State<ApiServices>,
    Query(query): Query<TrendsQuery>,
) -> Json<Vec<HistoricalTrend>> {
    Json(services.analytics.historical_trends(query.department_code))
}
