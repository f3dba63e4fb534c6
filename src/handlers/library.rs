//! # Library listing handlers
//!
//! Read-side endpoints: resolve the caller's token for one provider,
//! delegate to the matching read operation, and translate the normalized
//! entities into their transport shape. Provider error kinds map to
//! caller-facing categories (`Unauthorized` means "reconnect the source").

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::ApiTokenAuth;
use crate::error::ApiError;
use crate::providers::types::{Album, Playlist, Source, Track};
use crate::repositories::SqlUnitOfWork;
use crate::server::AppState;
use crate::token_manager::resolve_token;

/// Query parameters for user-level listings
#[derive(Debug, Deserialize, IntoParams)]
pub struct LibraryQuery {
    pub user_id: String,
    pub app_bundle: String,
    /// Provider to list from (defaults to spotify)
    pub source: Option<Source>,
}

/// Query parameters for track listings
#[derive(Debug, Deserialize, IntoParams)]
pub struct TracksQuery {
    pub user_id: String,
    pub app_bundle: String,
    /// Playlist to read; ignored by the favorites feed
    pub playlist_id: Option<String>,
    /// Provider to list from (defaults to spotify)
    pub source: Option<Source>,
}

/// Playlist representation returned to callers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaylistRead {
    /// Provider-native playlist id
    pub id: String,
    pub name: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<Playlist> for PlaylistRead {
    fn from(model: Playlist) -> Self {
        Self {
            id: model.source_id,
            name: model.name,
            source: model.source,
            url: model.url,
            image_url: model.image_url,
        }
    }
}

/// Album representation returned to callers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlbumRead {
    /// Provider-native album id
    pub id: String,
    pub name: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<Album> for AlbumRead {
    fn from(model: Album) -> Self {
        Self {
            id: model.source_id,
            name: model.name,
            source: model.source,
            image_url: model.image_url,
        }
    }
}

/// Track representation returned to callers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackRead {
    /// Provider-native track id
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<Track> for TrackRead {
    fn from(model: Track) -> Self {
        Self {
            id: model.source_id,
            name: model.name,
            artist: model.artist_name,
            image_url: model.image_url,
        }
    }
}

/// List the user's playlists on one provider
#[utoipa::path(
    get,
    path = "/playlist",
    params(LibraryQuery),
    responses(
        (status = 200, description = "User playlists", body = [PlaylistRead]),
        (status = 400, description = "Source not connected or unsupported", body = ApiError),
        (status = 401, description = "Source tokens expired", body = ApiError),
        (status = 404, description = "Provider returned no items", body = ApiError)
    ),
    tag = "library"
)]
pub async fn list_playlists(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Vec<PlaylistRead>>, ApiError> {
    let client = state.registry.get(query.source.unwrap_or(Source::Spotify))?;
    let uow = SqlUnitOfWork::new(state.db.clone());

    let token = resolve_token(&uow, client.as_ref(), &query.user_id, &query.app_bundle).await?;
    let playlists = client.list_playlists(&token).await?;

    Ok(Json(playlists.into_iter().map(Into::into).collect()))
}

/// List the user's saved albums on one provider
#[utoipa::path(
    get,
    path = "/album",
    params(LibraryQuery),
    responses(
        (status = 200, description = "User albums", body = [AlbumRead]),
        (status = 400, description = "Source not connected or has no album library", body = ApiError),
        (status = 401, description = "Source tokens expired", body = ApiError),
        (status = 404, description = "Provider returned no items", body = ApiError)
    ),
    tag = "library"
)]
pub async fn list_albums(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Vec<AlbumRead>>, ApiError> {
    let client = state.registry.get(query.source.unwrap_or(Source::Spotify))?;
    let uow = SqlUnitOfWork::new(state.db.clone());

    let token = resolve_token(&uow, client.as_ref(), &query.user_id, &query.app_bundle).await?;
    let albums = client.list_albums(&token).await?;

    Ok(Json(albums.into_iter().map(Into::into).collect()))
}

/// List the tracks of one playlist
#[utoipa::path(
    get,
    path = "/playlist/tracks",
    params(TracksQuery),
    responses(
        (status = 200, description = "Playlist tracks", body = [TrackRead]),
        (status = 400, description = "Source not connected or playlist_id missing", body = ApiError),
        (status = 401, description = "Source tokens expired", body = ApiError),
        (status = 404, description = "Provider returned no items", body = ApiError)
    ),
    tag = "library"
)]
pub async fn list_playlist_tracks(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Query(query): Query<TracksQuery>,
) -> Result<Json<Vec<TrackRead>>, ApiError> {
    let playlist_id = query
        .playlist_id
        .as_deref()
        .ok_or_else(|| ApiError::validation("playlist_id is required"))?;

    let client = state.registry.get(query.source.unwrap_or(Source::Spotify))?;
    let uow = SqlUnitOfWork::new(state.db.clone());

    let token = resolve_token(&uow, client.as_ref(), &query.user_id, &query.app_bundle).await?;
    let tracks = client.list_playlist_tracks(&token, playlist_id).await?;

    Ok(Json(tracks.into_iter().map(Into::into).collect()))
}

/// List the user's liked/saved tracks on one provider
#[utoipa::path(
    get,
    path = "/favorite",
    params(TracksQuery),
    responses(
        (status = 200, description = "Favorite tracks", body = [TrackRead]),
        (status = 400, description = "Source not connected or has no favorites feed", body = ApiError),
        (status = 401, description = "Source tokens expired", body = ApiError),
        (status = 404, description = "Provider returned no items", body = ApiError)
    ),
    tag = "library"
)]
pub async fn list_favorite_tracks(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Query(query): Query<TracksQuery>,
) -> Result<Json<Vec<TrackRead>>, ApiError> {
    let client = state.registry.get(query.source.unwrap_or(Source::Spotify))?;
    let uow = SqlUnitOfWork::new(state.db.clone());

    let token = resolve_token(&uow, client.as_ref(), &query.user_id, &query.app_bundle).await?;
    let tracks = client.list_favorite_tracks(&token).await?;

    Ok(Json(tracks.into_iter().map(Into::into).collect()))
}
