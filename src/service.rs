use crate::database::LocationStore;
use crate::error::ForecastError;
use crate::forecast::cache::{ForecastCache, Lookup};
use crate::forecast::{Granularity, WeatherSource};
use crate::geocode::Coordinates;
use crate::normalize::{
    normalize_city, normalize_period, normalize_state, parse_hour_count, random_period, City,
    Period, State,
};
use crate::resolver::LocationResolver;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailedForecast {
    pub forecast: String,
    pub city: City,
    pub state: State,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub forecasts: Vec<String>,
    pub city: City,
    pub state: State,
    pub hours: u32,
}

/// Answers forecast requests from the cache, falling back to the weather
/// source and refilling the cache on a miss.
pub struct ForecastService {
    cache: ForecastCache,
    resolver: LocationResolver,
    store: Arc<dyn LocationStore>,
    weather: Arc<dyn WeatherSource>,
    rng: Mutex<StdRng>,
}

impl ForecastService {
    pub fn new(
        cache: ForecastCache,
        resolver: LocationResolver,
        store: Arc<dyn LocationStore>,
        weather: Arc<dyn WeatherSource>,
        rng: StdRng,
    ) -> Self {
        Self {
            cache,
            resolver,
            store,
            weather,
            rng: Mutex::new(rng),
        }
    }

    pub async fn detailed(
        &self,
        city: &str,
        state: &str,
        period: &str,
    ) -> Result<DetailedForecast, ForecastError> {
        let state = normalize_state(state)?;
        let period = normalize_period(period)?;
        let city = normalize_city(city);

        let forecast = match self.cache.lookup_detailed(&city, &state, &period).await? {
            Lookup::Hit(forecast) => {
                tracing::debug!(
                    "Cache hit for {}, {} {}",
                    city.as_name,
                    state.as_name,
                    period.as_name
                );
                self.resolver.count_request(&city, &state).await;
                forecast
            }
            Lookup::Miss => {
                let coords = self.resolver.resolve(&city, &state).await?;
                self.fetch_detailed(&city, &state, &period, coords).await?
            }
        };

        Ok(DetailedForecast {
            forecast,
            city,
            state,
            period,
        })
    }

    /// A detailed forecast for a random registered location and period.
    pub async fn random_detailed(&self) -> Result<DetailedForecast, ForecastError> {
        let location = self
            .store
            .random_location()
            .await?
            .ok_or(ForecastError::NoRegisteredLocations)?;
        let city = normalize_city(&location.city);
        let state = normalize_state(&location.state)?;
        let period = {
            let mut rng = self.rng.lock().await;
            random_period(&mut *rng)
        };

        let forecast = match self.cache.lookup_detailed(&city, &state, &period).await? {
            Lookup::Hit(forecast) => forecast,
            Lookup::Miss => {
                self.fetch_detailed(&city, &state, &period, location.coordinates())
                    .await?
            }
        };
        self.resolver.count_request(&city, &state).await;

        Ok(DetailedForecast {
            forecast,
            city,
            state,
            period,
        })
    }

    pub async fn hourly(
        &self,
        city: &str,
        state: &str,
        hours: &str,
    ) -> Result<HourlyForecast, ForecastError> {
        let city = normalize_city(city);
        let state = normalize_state(state)?;
        let hours = parse_hour_count(hours)?;

        let forecasts = match self.cache.lookup_hourly(&city, &state, hours).await? {
            Lookup::Hit(forecasts) => {
                tracing::debug!("Cache hit for hourly {}, {}", city.as_name, state.as_name);
                self.resolver.count_request(&city, &state).await;
                forecasts
            }
            Lookup::Miss => {
                let coords = self.resolver.resolve(&city, &state).await?;
                let periods = self
                    .weather
                    .fetch_forecast_periods(coords.lat, coords.lng, Granularity::Hourly)
                    .await?;
                self.cache.cache_hourly(&city, &state, hours, &periods).await
            }
        };

        Ok(HourlyForecast {
            forecasts,
            city,
            state,
            hours,
        })
    }

    async fn fetch_detailed(
        &self,
        city: &City,
        state: &State,
        period: &Period,
        coords: Coordinates,
    ) -> Result<String, ForecastError> {
        let periods = self
            .weather
            .fetch_forecast_periods(coords.lat, coords.lng, Granularity::Detailed)
            .await?;
        Ok(self.cache.cache_detailed(city, state, period, &periods).await)
    }
}
