//! Cache-aside storage for forecast text.
//!
//! Detailed forecasts live under `<city>_<state>_<weekday>[_night]`, one key
//! per forecast slot, each expiring when its slot ends. Hourly forecasts
//! live as one list under `<city>_<state>_hourly` that expires at the top
//! of the next hour.

use super::types::ForecastPeriod;
use crate::cache::{CacheBackend, CacheError};
use crate::normalize::{City, Period, State};
use chrono::{DateTime, Datelike, Duration, DurationRound, SecondsFormat, Utc};
use std::sync::Arc;

/// Result of a cache read. A miss is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
}

pub fn detailed_key(city: &City, state: &State, period: &Period) -> String {
    format!("{}_{}_{}", city.as_key, state.as_key, period.as_key)
}

pub fn hourly_key(city: &City, state: &State) -> String {
    format!("{}_{}_hourly", city.as_key, state.as_key)
}

/// The period a forecast slot covers, from its local start weekday.
pub fn period_of(forecast: &ForecastPeriod) -> Period {
    Period::new(forecast.start_time.weekday(), forecast.is_daytime)
}

pub fn format_hourly(forecast: &ForecastPeriod) -> String {
    format!(
        "{} Forecast: {}, Temperature: {}\u{00B0} {}, Wind: {} {}",
        forecast.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        forecast.short_forecast,
        forecast.temperature as i64,
        forecast.temperature_unit,
        forecast.wind_speed,
        forecast.wind_direction
    )
}

/// Start of the clock hour after `now`.
pub fn next_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    truncated + Duration::hours(1)
}

#[derive(Clone)]
pub struct ForecastCache {
    backend: Arc<dyn CacheBackend>,
}

impl ForecastCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Stores every slot of `forecasts` and returns the text for `period`,
    /// or an empty string when no slot covers it.
    pub async fn cache_detailed(
        &self,
        city: &City,
        state: &State,
        period: &Period,
        forecasts: &[ForecastPeriod],
    ) -> String {
        self.cache_detailed_at(city, state, period, forecasts, Utc::now())
            .await
    }

    pub async fn cache_detailed_at(
        &self,
        city: &City,
        state: &State,
        period: &Period,
        forecasts: &[ForecastPeriod],
        now: DateTime<Utc>,
    ) -> String {
        let mut detailed_forecast = String::new();
        for forecast in forecasts {
            let slot = period_of(forecast);
            let key = detailed_key(city, state, &slot);
            let ttl = forecast.end_time.with_timezone(&Utc) - now;
            if let Err(e) = self
                .backend
                .set_ex(&key, forecast.detailed_forecast.clone(), ttl)
                .await
            {
                tracing::error!("Failed to cache detailed forecast under {}: {}", key, e);
            }
            if slot == *period {
                detailed_forecast = forecast.detailed_forecast.clone();
            }
        }
        detailed_forecast
    }

    pub async fn lookup_detailed(
        &self,
        city: &City,
        state: &State,
        period: &Period,
    ) -> Result<Lookup<String>, CacheError> {
        let key = detailed_key(city, state, period);
        Ok(match self.backend.get(&key).await? {
            Some(forecast) => Lookup::Hit(forecast),
            None => Lookup::Miss,
        })
    }

    /// Stores every hourly slot as one list and returns the first `hours` lines.
    pub async fn cache_hourly(
        &self,
        city: &City,
        state: &State,
        hours: u32,
        forecasts: &[ForecastPeriod],
    ) -> Vec<String> {
        self.cache_hourly_at(city, state, hours, forecasts, Utc::now())
            .await
    }

    pub async fn cache_hourly_at(
        &self,
        city: &City,
        state: &State,
        hours: u32,
        forecasts: &[ForecastPeriod],
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let key = hourly_key(city, state);
        let hourly_forecasts: Vec<String> = forecasts.iter().map(format_hourly).collect();

        if let Err(e) = self
            .backend
            .store_list(&key, hourly_forecasts.clone(), next_hour(now))
            .await
        {
            tracing::error!("Failed to cache hourly forecasts under {}: {}", key, e);
        }

        hourly_forecasts.into_iter().take(hours as usize).collect()
    }

    pub async fn lookup_hourly(
        &self,
        city: &City,
        state: &State,
        hours: u32,
    ) -> Result<Lookup<Vec<String>>, CacheError> {
        let key = hourly_key(city, state);
        let forecasts = self.backend.range(&key, hours as usize).await?;
        // an empty range is indistinguishable from an absent key
        if forecasts.is_empty() {
            Ok(Lookup::Miss)
        } else {
            Ok(Lookup::Hit(forecasts))
        }
    }
}
