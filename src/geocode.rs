use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("thorcast-server/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("location not found")]
    NotFound,
    #[error("geocoding unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up a city and state given in their URL-safe forms.
    async fn geocode(&self, city: &str, state: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeApiResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
    #[serde(default)]
    partial_match: bool,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: Coordinates,
}

impl GeocodeApiResponse {
    fn into_coordinates(self) -> Result<Coordinates, GeocodeError> {
        match self.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Err(GeocodeError::NotFound),
            other => return Err(GeocodeError::Unavailable(format!("status {}", other))),
        }
        let first = self.results.into_iter().next().ok_or(GeocodeError::NotFound)?;
        // a partial match is Google guessing at a different place
        if first.partial_match {
            return Err(GeocodeError::NotFound);
        }
        Ok(first.geometry.location)
    }
}

pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: config.google_geocode_url.clone(),
            api_key: config.google_maps_api_key.clone(),
        })
    }

    fn request_url(&self, city: &str, state: &str) -> String {
        format!(
            "{}?address={},{}&key={}",
            self.base_url,
            encode_plus_separated(city),
            encode_plus_separated(state),
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Percent-encodes each `+`-separated word, keeping the `+` separators.
fn encode_plus_separated(raw: &str) -> String {
    raw.split('+')
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, city: &str, state: &str) -> Result<Coordinates, GeocodeError> {
        let url = self.request_url(city, state);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        let body: GeocodeApiResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Unavailable(format!("JSON decoding failed: {}", e)))?;

        tracing::debug!("Geocoding {},{} returned status {}", city, state, body.status);
        body.into_coordinates()
    }
}
