use crate::geocode::Coordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("location {city}, {state} is already registered")]
    DuplicateKey { city: String, state: String },
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// A row of the `geocodex` table, minus its request counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Persistent registry of geocoded locations and how often each is asked for.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Coordinates for a city (any case) and exact state code.
    async fn select_coords(&self, city: &str, state: &str)
        -> Result<Option<Coordinates>, StoreError>;

    /// Registers a new location with a request count of one.
    async fn insert_location(&self, location: &Location) -> Result<(), StoreError>;

    async fn increment_request_count(&self, city: &str, state: &str) -> Result<(), StoreError>;

    async fn random_location(&self) -> Result<Option<Location>, StoreError>;
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS geocodex (
                city TEXT NOT NULL COLLATE NOCASE,
                state TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                requests INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (city, state)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn request_count(&self, city: &str, state: &str) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query(
            "SELECT requests FROM geocodex WHERE LOWER(city) = LOWER($1) AND state = $2",
        )
        .bind(city)
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get("requests")))
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LocationStore for Database {
    async fn select_coords(
        &self,
        city: &str,
        state: &str,
    ) -> Result<Option<Coordinates>, StoreError> {
        let row = sqlx::query(
            "SELECT lat, lng FROM geocodex WHERE LOWER(city) = LOWER($1) AND state = $2",
        )
        .bind(city)
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Coordinates {
            lat: row.get("lat"),
            lng: row.get("lng"),
        }))
    }

    async fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO geocodex (city, state, lat, lng, requests)
            VALUES ($1, $2, $3, $4, 1)
            "#,
        )
        .bind(&location.city)
        .bind(&location.state)
        .bind(location.lat)
        .bind(location.lng)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateKey {
                    city: location.city.clone(),
                    state: location.state.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn increment_request_count(&self, city: &str, state: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE geocodex SET requests = requests + 1 WHERE LOWER(city) = LOWER($1) AND state = $2",
        )
        .bind(city)
        .bind(state)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn random_location(&self) -> Result<Option<Location>, StoreError> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT city, state, lat, lng FROM geocodex ORDER BY RANDOM() LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }
}

#[cfg(test)]
pub async fn memory_database() -> Database {
    // every connection to sqlite::memory: opens a separate database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let database = Database::new(pool);
    database.init_tables().await.unwrap();
    database
}
