use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::Config,
    database::Database,
    error::{error_response, ForecastError},
    service::{DetailedForecast, ForecastService},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<Database>,
    pub service: Arc<ForecastService>,
}

#[derive(Debug, Deserialize)]
pub struct DetailedQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub hours: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

type FlatResponse = Json<HashMap<&'static str, String>>;

fn required(value: Option<String>, name: &'static str) -> Result<String, ForecastError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ForecastError::MissingParameter(name))
}

fn detailed_response(detailed: DetailedForecast) -> FlatResponse {
    Json(HashMap::from([
        ("forecast", detailed.forecast),
        ("city", detailed.city.as_name),
        ("state", detailed.state.as_name),
        ("period", detailed.period.as_name),
    ]))
}

// Route handlers
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    if let Err(e) = state.database.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

pub async fn detailed_forecast(
    State(state): State<AppState>,
    Query(params): Query<DetailedQuery>,
) -> Result<FlatResponse, ForecastError> {
    let city = required(params.city, "city")?;
    let region = required(params.state, "state")?;
    let period = params.period.unwrap_or_else(|| "today".to_string());

    let detailed = state.service.detailed(&city, &region, &period).await?;
    Ok(detailed_response(detailed))
}

pub async fn random_detailed_forecast(
    State(state): State<AppState>,
) -> Result<FlatResponse, ForecastError> {
    let detailed = state.service.random_detailed().await?;
    Ok(detailed_response(detailed))
}

pub async fn hourly_forecast(
    State(state): State<AppState>,
    Query(params): Query<HourlyQuery>,
) -> Result<FlatResponse, ForecastError> {
    let city = required(params.city, "city")?;
    let region = required(params.state, "state")?;
    let hours = params
        .hours
        .unwrap_or_else(|| state.config.default_hours.clone());

    let hourly = state.service.hourly(&city, &region, &hours).await?;
    Ok(Json(HashMap::from([
        ("forecast", hourly.forecasts.join("\n")),
        ("city", hourly.city.as_name),
        ("state", hourly.state.as_name),
        ("hours", hourly.hours.to_string()),
    ])))
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND)
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/forecast/detailed", get(detailed_forecast))
        .route("/api/forecast/detailed/random", get(random_detailed_forecast))
        .route("/api/forecast/hourly", get(hourly_forecast))
        .fallback(not_found)
        .with_state(state)
}
