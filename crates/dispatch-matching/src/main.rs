use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use dispatch_matching::auth::JwtAuthenticator;
use dispatch_matching::{
    create_router, AppState, LocationClient, MatchingApiConfig, MatchingService,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatch_matching=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MatchingApiConfig::from_env().context("invalid matching service configuration")?;

    tracing::info!(
        port = config.port,
        location_url = %config.location_url,
        request_timeout_secs = config.request_timeout.as_secs(),
        connect_timeout_secs = config.connect_timeout.as_secs(),
        "Starting matching service"
    );
    if config.location_api_key.is_none() {
        tracing::warn!(
            "DISPATCH_LOCATION_API_KEY is not set; location requests will be unauthenticated"
        );
    }

    let client = LocationClient::new(config.client_config())
        .context("failed to create location service client")?;
    let breaker = client.breaker().clone();

    let service = Arc::new(MatchingService::new(Arc::new(client), config.max_radius_meters));
    let state = Arc::new(AppState::new(
        service,
        JwtAuthenticator::new(&config.jwt_secret),
        breaker,
    ));

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
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Matching service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
