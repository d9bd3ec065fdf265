use super::types::*;
use super::{Granularity, WeatherError, WeatherSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

fn offset() -> FixedOffset {
    FixedOffset::west_opt(6 * 3600).unwrap()
}

/// Seven daytime periods starting today, one per weekday, each ending a
/// day from now.
pub fn daily_periods(now: DateTime<Utc>) -> Vec<ForecastPeriod> {
    let end = (now + Duration::days(1)).with_timezone(&offset());
    (0..7)
        .map(|day| {
            let start = (now + Duration::days(day)).with_timezone(&offset());
            ForecastPeriod {
                number: day as u32 + 1,
                name: format!("Day {}", day),
                start_time: start,
                end_time: end,
                is_daytime: true,
                temperature: 60.0 + day as f64,
                temperature_unit: "F".to_string(),
                wind_speed: "10 mph".to_string(),
                wind_direction: "S".to_string(),
                short_forecast: "Sunny".to_string(),
                detailed_forecast: format!("Forecast text for day {}", day),
            }
        })
        .collect()
}

/// Alternating day and night periods, twelve hours each, starting at `start`.
pub fn day_night_periods(start: DateTime<Utc>, count: usize) -> Vec<ForecastPeriod> {
    (0..count)
        .map(|i| {
            let begin = start + Duration::hours(12 * i as i64);
            ForecastPeriod {
                number: i as u32 + 1,
                name: format!("Period {}", i),
                start_time: begin.with_timezone(&offset()),
                end_time: (begin + Duration::hours(12)).with_timezone(&offset()),
                is_daytime: i % 2 == 0,
                temperature: 50.0,
                temperature_unit: "F".to_string(),
                wind_speed: "5 mph".to_string(),
                wind_direction: "N".to_string(),
                short_forecast: "Cloudy".to_string(),
                detailed_forecast: format!("Detailed period {}", i),
            }
        })
        .collect()
}

/// Consecutive one-hour periods starting at `start`.
pub fn hourly_periods(start: DateTime<Utc>, count: usize) -> Vec<ForecastPeriod> {
    (0..count)
        .map(|hour| {
            let begin = start + Duration::hours(hour as i64);
            ForecastPeriod {
                number: hour as u32 + 1,
                name: String::new(),
                start_time: begin.with_timezone(&offset()),
                end_time: (begin + Duration::hours(1)).with_timezone(&offset()),
                is_daytime: true,
                temperature: 70.6 + hour as f64,
                temperature_unit: "F".to_string(),
                wind_speed: "12 mph".to_string(),
                wind_direction: "SW".to_string(),
                short_forecast: "Partly Cloudy".to_string(),
                detailed_forecast: String::new(),
            }
        })
        .collect()
}

/// Serves canned periods and counts how often it was asked.
pub struct MockWeatherSource {
    pub detailed: Vec<ForecastPeriod>,
    pub hourly: Vec<ForecastPeriod>,
    pub fail: bool,
    calls: AtomicUsize,
}

impl MockWeatherSource {
    pub fn new(detailed: Vec<ForecastPeriod>, hourly: Vec<ForecastPeriod>) -> Self {
        Self {
            detailed,
            hourly,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new(), Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn fetch_forecast_periods(
        &self,
        _lat: f64,
        _lng: f64,
        granularity: Granularity,
    ) -> Result<Vec<ForecastPeriod>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(WeatherError::ApiError("HTTP 503 Service Unavailable".to_string()));
        }
        Ok(match granularity {
            Granularity::Detailed => self.detailed.clone(),
            Granularity::Hourly => self.hourly.clone(),
        })
    }
}
