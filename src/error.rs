use crate::cache::CacheError;
use crate::database::StoreError;
use crate::forecast::WeatherError;
use crate::normalize::NormalizeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Why a forecast request could not be answered.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error(transparent)]
    InvalidInput(#[from] NormalizeError),
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),
    #[error("location not found: {0}, {1}")]
    LocationNotFound(String, String),
    #[error("no locations have been registered yet")]
    NoRegisteredLocations,
    #[error("geocoding failed: {0}")]
    GeocodeUnavailable(String),
    #[error("location store failed: {0}")]
    Store(#[from] StoreError),
    #[error("weather fetch failed: {0}")]
    Fetch(#[from] WeatherError),
    #[error("cache failed: {0}")]
    Cache(#[from] CacheError),
}

impl ForecastError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForecastError::InvalidInput(_) | ForecastError::MissingParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            ForecastError::LocationNotFound(..) | ForecastError::NoRegisteredLocations => {
                StatusCode::NOT_FOUND
            }
            ForecastError::GeocodeUnavailable(_)
            | ForecastError::Store(_)
            | ForecastError::Fetch(_)
            | ForecastError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{"error": "<reason phrase>"}` with the matching status.
pub fn error_response(code: StatusCode) -> Response {
    let reason = code.canonical_reason().unwrap_or("Unknown Error");
    (code, Json(json!({ "error": reason }))).into_response()
}

impl IntoResponse for ForecastError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::error!("Forecast request failed: {}", self);
        } else {
            tracing::info!("Rejected forecast request: {}", self);
        }
        error_response(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ForecastError::from(NormalizeError::InvalidState("West Dakota".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ForecastError::MissingParameter("city").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ForecastError::LocationNotFound("Atlantis".to_string(), "FL".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ForecastError::GeocodeUnavailable("status UNKNOWN_ERROR".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ForecastError::from(WeatherError::RateLimited(4)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
