use super::types::*;
use super::{Granularity, WeatherSource};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Rate limited, retry after: {0}s")]
    RateLimited(u64),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("No {0:?} forecast URL for point {1}")]
    MissingForecastUrl(Granularity, String),
}

pub struct WeatherGovClient {
    client: Client,
    base_url: String,
}

impl WeatherGovClient {
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent(config.weather_gov_user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.weather_gov_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves the forecast URL weather.gov assigns to a point.
    pub async fn forecast_url(
        &self,
        lat: f64,
        lng: f64,
        granularity: Granularity,
    ) -> Result<String, WeatherError> {
        let point = point_label(lat, lng);
        let url = format!("{}/points/{}", self.base_url, point);
        let points: PointsResponse = self.get_json(&url).await?;

        let forecast_url = match granularity {
            Granularity::Detailed => points.properties.forecast,
            Granularity::Hourly => points.properties.forecast_hourly,
        };
        forecast_url.ok_or(WeatherError::MissingForecastUrl(granularity, point))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let mut retry_count = 0;
        let max_retries = 3;
        let mut delay = Duration::from_millis(1000);

        loop {
            let response = self
                .client
                .get(url)
                .header("Accept", "application/geo+json")
                .send()
                .await?;

            match response.status() {
                reqwest::StatusCode::OK => {
                    let body = response.text().await?;
                    return Ok(serde_json::from_str(&body)?);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    if retry_count >= max_retries {
                        return Err(WeatherError::RateLimited(delay.as_secs()));
                    }

                    tracing::warn!(
                        "Rate limited by weather.gov, retrying in {}ms",
                        delay.as_millis()
                    );

                    sleep(delay).await;
                    delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5);
                    retry_count += 1;
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(WeatherError::ApiError(format!(
                        "HTTP {} for {}: {}",
                        status,
                        url,
                        error_text.chars().take(500).collect::<String>()
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherGovClient {
    async fn fetch_forecast_periods(
        &self,
        lat: f64,
        lng: f64,
        granularity: Granularity,
    ) -> Result<Vec<ForecastPeriod>, WeatherError> {
        let url = self.forecast_url(lat, lng, granularity).await?;
        tracing::debug!("Fetching {:?} forecast from {}", granularity, url);

        let forecast: ForecastResponse = self.get_json(&url).await?;
        tracing::debug!(
            "Got {} forecast periods for {}",
            forecast.properties.periods.len(),
            point_label(lat, lng)
        );
        Ok(forecast.properties.periods)
    }
}

// weather.gov redirects requests with more than four decimal places
fn point_label(lat: f64, lng: f64) -> String {
    format!("{:.4},{:.4}", lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_label() {
        assert_eq!(point_label(39.7392358, -104.990251), "39.7392,-104.9903");
        assert_eq!(point_label(40.0, -105.0), "40.0000,-105.0000");
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let mut config = Config::for_tests();
        config.weather_gov_base_url = "https://api.weather.gov/".to_string();
        let client = WeatherGovClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.weather.gov");
    }
}
