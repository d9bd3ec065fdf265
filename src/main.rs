use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thorcast_server::{
    cache::MemoryCache,
    config::Config,
    database::Database,
    forecast::{cache::ForecastCache, WeatherGovClient},
    geocode::GoogleGeocoder,
    resolver::LocationResolver,
    routes::{create_router, AppState},
    service::ForecastService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thorcast_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database
    let pool = sqlx::SqlitePool::connect(&config.database_url).await?;
    let database = Arc::new(Database::new(pool));
    database.init_tables().await?;

    // Initialize collaborators
    let geocoder = Arc::new(GoogleGeocoder::new(&config)?);
    let weather = Arc::new(WeatherGovClient::new(&config)?);
    let cache = ForecastCache::new(Arc::new(MemoryCache::new(config.cache_max_capacity)));
    let resolver = LocationResolver::new(database.clone(), geocoder);

    let service = Arc::new(ForecastService::new(
        cache,
        resolver,
        database.clone(),
        weather,
        StdRng::from_entropy(),
    ));

    let addr = config.listen_addr();
    let state = AppState {
        config: Arc::new(config),
        database,
        service,
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
