use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub google_maps_api_key: String,
    pub google_geocode_url: String,
    pub weather_gov_base_url: String,
    pub weather_gov_user_agent: String,
    pub cache_max_capacity: u64,
    pub default_hours: String,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let default_hours = env::var("DEFAULT_HOURS").unwrap_or_else(|_| "12".to_string());
        // fail at startup rather than on the first request that omits `hours`
        default_hours
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("DEFAULT_HOURS must be a non-negative integer"))?;

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./thorcast.db?mode=rwc".to_string()),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .map_err(|_| anyhow::anyhow!("GOOGLE_MAPS_API_KEY not set"))?,
            google_geocode_url: env::var("GOOGLE_GEOCODE_URL").unwrap_or_else(|_| {
                "https://maps.googleapis.com/maps/api/geocode/json".to_string()
            }),
            weather_gov_base_url: env::var("WEATHER_GOV_BASE_URL")
                .unwrap_or_else(|_| "https://api.weather.gov".to_string()),
            weather_gov_user_agent: env::var("WEATHER_GOV_USER_AGENT")
                .unwrap_or_else(|_| "Thorcast/1.0".to_string()),
            cache_max_capacity: parse_var("CACHE_MAX_CAPACITY", 10_000)?,
            default_hours,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_var("SERVER_PORT", 8080)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            google_maps_api_key: "test-key".to_string(),
            google_geocode_url: "http://127.0.0.1:9/geocode".to_string(),
            weather_gov_base_url: "http://127.0.0.1:9".to_string(),
            weather_gov_user_agent: "Thorcast/test".to_string(),
            cache_max_capacity: 1_000,
            default_hours: "12".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let mut config = Config::for_tests();
        config.server_host = "0.0.0.0".to_string();
        config.server_port = 8080;
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_var_default() {
        let value: u16 = parse_var("THORCAST_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
