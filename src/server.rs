//! # Server Configuration
//!
//! This module contains the server setup and configuration for the
//! trackshift API.

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::{self, connect, library, transfers};
use crate::providers::ProviderRegistry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub registry: Arc<ProviderRegistry>,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/source/connect", post(connect::connect_source))
        .route("/source/authorize", get(connect::authorize_link))
        .route(
            "/playlist",
            post(transfers::start_playlist_transfer).get(library::list_playlists),
        )
        .route("/playlist/tracks", get(library::list_playlist_tracks))
        .route(
            "/album",
            post(transfers::start_album_transfer).get(library::list_albums),
        )
        .route("/favorite", get(library::list_favorite_tracks))
        .route("/{transfer_id}", get(transfers::get_transfer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let config = Arc::new(config);
    let registry = Arc::new(ProviderRegistry::from_config(&config));
    let state = AppState {
        db,
        config,
        registry,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::connect::connect_source,
        crate::handlers::connect::authorize_link,
        crate::handlers::transfers::start_playlist_transfer,
        crate::handlers::transfers::start_album_transfer,
        crate::handlers::transfers::get_transfer,
        crate::handlers::library::list_playlists,
        crate::handlers::library::list_albums,
        crate::handlers::library::list_playlist_tracks,
        crate::handlers::library::list_favorite_tracks,
    ),
    components(
        schemas(
            crate::error::ApiError,
            crate::models::ServiceInfo,
            crate::models::TransferStatus,
            crate::providers::Source,
            crate::handlers::connect::ConnectSourceRequest,
            crate::handlers::connect::AuthorizeLinkResponse,
            crate::handlers::transfers::TransferPlaylistRequest,
            crate::handlers::transfers::TransferAlbumRequest,
            crate::handlers::transfers::TransferRead,
            crate::handlers::library::PlaylistRead,
            crate::handlers::library::AlbumRead,
            crate::handlers::library::TrackRead,
        )
    ),
    info(
        title = "Trackshift API",
        description = "API for moving music libraries between streaming providers",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
