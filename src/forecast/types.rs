use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One slot of a weather.gov forecast.
///
/// Start and end times keep the offset the forecast office reported them
/// in, so the weekday of a slot is the local weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub is_daytime: bool,
    pub temperature: f64,
    #[serde(default)]
    pub temperature_unit: String,
    #[serde(default)]
    pub wind_speed: String,
    #[serde(default)]
    pub wind_direction: String,
    #[serde(default)]
    pub short_forecast: String,
    #[serde(default)]
    pub detailed_forecast: String,
}

/// Response of `/points/{lat},{lng}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PointsResponse {
    pub properties: PointsProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsProperties {
    pub forecast: Option<String>,
    pub forecast_hourly: Option<String>,
}

/// Response of a `forecast` or `forecastHourly` URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub periods: Vec<ForecastPeriod>,
}
