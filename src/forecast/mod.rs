pub mod cache;
#[cfg(test)]
pub mod mock;
pub mod types;
pub mod weather_gov;

use async_trait::async_trait;
use types::ForecastPeriod;
pub use weather_gov::{WeatherError, WeatherGovClient};

/// Which forecast product to fetch for a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Twelve-hour day and night periods with detailed text.
    Detailed,
    Hourly,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_forecast_periods(
        &self,
        lat: f64,
        lng: f64,
        granularity: Granularity,
    ) -> Result<Vec<ForecastPeriod>, WeatherError>;
}
