use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spotify_genres::config::Config;
use spotify_genres::engine::GenreEngine;
use spotify_genres::handlers::{router, AppState};
use spotify_genres::spotify::shortlink::ShortlinkClient;
use spotify_genres::spotify::SpotifyClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let spotify = SpotifyClient::new(config.spotify_client_id, config.spotify_client_secret);
    spotify
        .authenticate()
        .await
        .context("could not get a Spotify access token")?;
    tracing::info!("authenticated against the Spotify API");

    let shortlinks = ShortlinkClient::new().context("could not build the shortlink client")?;
    let engine = GenreEngine::new(Arc::new(spotify), Arc::new(shortlinks))
        .with_playlist_concurrency(config.playlist_concurrency)
        .with_request_timeout(config.request_timeout);

    let app = router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(Any),
        )
        .with_state(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
