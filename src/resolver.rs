use crate::database::{Location, LocationStore, StoreError};
use crate::error::ForecastError;
use crate::geocode::{Coordinates, GeocodeError, Geocoder};
use crate::normalize::{City, State};
use std::sync::Arc;

/// Finds coordinates for a place, remembering every place it has geocoded.
#[derive(Clone)]
pub struct LocationResolver {
    store: Arc<dyn LocationStore>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(store: Arc<dyn LocationStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    pub async fn resolve(&self, city: &City, state: &State) -> Result<Coordinates, ForecastError> {
        if let Some(coords) = self
            .store
            .select_coords(&city.as_name, &state.as_name)
            .await?
        {
            self.count_request(city, state).await;
            return Ok(coords);
        }

        let coords = self
            .geocoder
            .geocode(&city.as_url, &state.as_url)
            .await
            .map_err(|e| match e {
                GeocodeError::NotFound => {
                    ForecastError::LocationNotFound(city.as_name.clone(), state.as_name.clone())
                }
                GeocodeError::Unavailable(reason) => ForecastError::GeocodeUnavailable(reason),
            })?;

        let location = Location {
            city: city.as_name.clone(),
            state: state.as_name.clone(),
            lat: coords.lat,
            lng: coords.lng,
        };
        match self.store.insert_location(&location).await {
            Ok(()) => {
                tracing::info!(
                    "Registered {}, {} at {:.4},{:.4}",
                    location.city,
                    location.state,
                    coords.lat,
                    coords.lng
                );
            }
            // another request registered the same place first
            Err(StoreError::DuplicateKey { .. }) => self.count_request(city, state).await,
            Err(e) => return Err(e.into()),
        }
        Ok(coords)
    }

    /// Bumps the request counter, logging rather than failing on error.
    pub async fn count_request(&self, city: &City, state: &State) {
        if let Err(e) = self
            .store
            .increment_request_count(&city.as_name, &state.as_name)
            .await
        {
            tracing::warn!(
                "Failed to increment requests for {}, {}: {}",
                city.as_name,
                state.as_name,
                e
            );
        }
    }
}
