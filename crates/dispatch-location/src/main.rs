use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderName, HeaderValue, Method};
use dispatch_core::ports::{LocationStore, ProximityCache};
use dispatch_location::auth::API_KEY_HEADER;
use dispatch_location::{create_router, AppState, LocationApiConfig, LocationService};
use dispatch_store::postgres::{PostgresConfig, PostgresLocationStore};
use dispatch_store::{
    MemoryLocationStore, MokaProximityCache, NoopProximityCache, RedisProximityCache,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dispatch_location=info,dispatch_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LocationApiConfig::from_env().context("invalid location service configuration")?;

    tracing::info!(
        port = config.port,
        postgres = config.uses_postgres(),
        cache_enabled = config.cache_enabled,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Starting driver location service"
    );

    let store = init_store(&config).await?;
    let cache = init_cache(&config).await;

    let service = Arc::new(LocationService::new(store, cache, config.service_config()));
    let state = Arc::new(AppState::new(service, config.api_key.clone()));

    let origin = if config.cors_origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("DISPATCH_CORS_ORIGIN is not a valid header value")?,
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-api-key")]);

    let app = create_router(state).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::debug!(header = API_KEY_HEADER, "Driver routes require an API key");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Location service stopped");
    Ok(())
}

async fn init_store(config: &LocationApiConfig) -> anyhow::Result<Arc<dyn LocationStore>> {
    if !config.uses_postgres() {
        tracing::info!("Using in-memory storage (set DATABASE_URL for PostgreSQL)");
        return Ok(Arc::new(MemoryLocationStore::new()));
    }

    tracing::info!("DATABASE_URL found, connecting to PostgreSQL...");
    let pg_config = PostgresConfig::from_env().context("invalid PostgreSQL configuration")?;

    match PostgresLocationStore::new(pg_config).await {
        Ok(store) => {
            tracing::info!("Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        Err(e) => {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            tracing::error!(
                "Remediation:\n\
                1. Ensure PostgreSQL with the PostGIS extension is running\n\
                2. Verify DATABASE_URL is correct\n\
                3. Check that the database exists and is accessible"
            );
            Err(e.into())
        }
    }
}

/// Pick the cache backend. A Redis outage at startup degrades to the
/// in-process cache rather than refusing to start.
async fn init_cache(config: &LocationApiConfig) -> Arc<dyn ProximityCache> {
    if !config.cache_enabled {
        tracing::info!("Proximity cache disabled");
        return Arc::new(NoopProximityCache);
    }

    if let Some(url) = &config.redis_url {
        match RedisProximityCache::connect(url).await {
            Ok(cache) => {
                tracing::info!("Using Redis proximity cache");
                return Arc::new(cache);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, falling back to in-process cache");
            }
        }
    }

    tracing::info!("Using in-process proximity cache");
    Arc::new(MokaProximityCache::default())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
