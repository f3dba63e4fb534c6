//! Spotify provider client
//!
//! Maps the Spotify Web API shapes onto the normalized entities. Listing
//! endpoints page at 50 items; the saved-album and saved-track feeds wrap
//! each item in an envelope object.

use async_trait::async_trait;
use base64::Engine as _;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::providers::http::{ApiClient, parse_shape};
use crate::providers::trait_::{ProviderClient, ProviderError};
use crate::providers::types::{Album, Playlist, Source, Token, Track};

const PAGE_LIMIT: u64 = 50;
const SCOPE: &str = "playlist-read-private playlist-read-public playlist-modify-private playlist-modify-public user-read-private user-library-modify user-library-read";

/// Configuration injected at construction; base URLs are overridable so
/// tests can point the client at a local mock server.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub api_base: String,
    pub accounts_base: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

pub struct SpotifyClient {
    api: ApiClient,
    accounts_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

/// Concrete token shape persisted for Spotify connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SpotifyToken {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyPage {
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyTracksRef {
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SpotifyExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    images: Option<Vec<SpotifyImage>>,
    #[serde(default)]
    tracks: Option<SpotifyTracksRef>,
    #[serde(default)]
    external_urls: Option<SpotifyExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrackData {
    id: String,
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

/// Envelope used by playlist-tracks and saved-tracks feeds.
#[derive(Debug, Deserialize)]
struct SpotifyTrackItem {
    track: SpotifyTrackData,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbumData {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    #[serde(default)]
    total_tracks: Option<u64>,
    #[serde(default)]
    images: Option<Vec<SpotifyImage>>,
}

/// Envelope used by the saved-albums feed.
#[derive(Debug, Deserialize)]
struct SpotifySavedAlbum {
    album: SpotifyAlbumData,
}

#[derive(Debug, Deserialize)]
struct SpotifyUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyRefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        Self {
            api: ApiClient::new(config.api_base),
            accounts_base: config.accounts_base.trim_end_matches('/').to_string(),
            client_id: config.client_id,
            client_secret: config.client_secret,
            redirect_uri: config.redirect_uri,
        }
    }

    fn parse_token(raw: &str) -> Result<SpotifyToken, ProviderError> {
        serde_json::from_str(raw).map_err(|e| ProviderError::InvalidToken {
            detail: e.to_string(),
        })
    }

    fn to_blob(token: &SpotifyToken) -> Result<Token, ProviderError> {
        let blob = serde_json::to_string(token).map_err(|e| ProviderError::InvalidToken {
            detail: e.to_string(),
        })?;
        Ok(Token::from_blob(blob))
    }

    fn access(token: &Token) -> Result<String, ProviderError> {
        Ok(Self::parse_token(token.blob())?.access_token)
    }

    /// Cheap authenticated probe used for token validation and to learn
    /// the playlist owner id before creating a playlist.
    async fn current_user(&self, access_token: &str) -> Result<SpotifyUser, ProviderError> {
        let response = self.api.get("/v1/me", access_token, &[]).await?;
        parse_shape(response)
    }

    async fn refresh(&self, token: &SpotifyToken) -> Result<SpotifyToken, ProviderError> {
        let authorization = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", self.client_id, self.client_secret))
        );
        let response = self
            .api
            .post_form(
                &format!("{}/api/token", self.accounts_base),
                Some(&authorization),
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", &token.refresh_token),
                    ("client_id", &self.client_id),
                ],
            )
            .await?;
        let refreshed: SpotifyRefreshResponse = parse_shape(response)?;
        Ok(SpotifyToken {
            access_token: refreshed.access_token,
            // Spotify only rotates the refresh secret sometimes
            refresh_token: refreshed
                .refresh_token
                .unwrap_or_else(|| token.refresh_token.clone()),
        })
    }

    /// Fetch a listing endpoint and split the page into typed items;
    /// zero items is a typed failure, not an empty collection.
    async fn list_page<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<T>, ProviderError> {
        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        query.extend(extra.iter().map(|(k, v)| (*k, v.clone())));
        let response = self.api.get(path, access_token, &query).await?;
        Self::split_page(response)
    }

    fn split_page<T: serde::de::DeserializeOwned>(page: Value) -> Result<Vec<T>, ProviderError> {
        let page: SpotifyPage = parse_shape(page)?;
        if page.items.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        page.items.into_iter().map(parse_shape).collect()
    }

    fn playlist_to_domain(model: SpotifyPlaylist) -> Playlist {
        Playlist {
            source_id: model.id,
            source: Source::Spotify,
            name: model.name,
            url: model.external_urls.and_then(|u| u.spotify),
            tracks_count: model.tracks.and_then(|t| t.total),
            image_url: model
                .images
                .and_then(|images| images.into_iter().next_back().map(|i| i.url)),
        }
    }

    fn track_to_domain(model: SpotifyTrackData) -> Track {
        Track {
            source_id: model.id,
            source: Source::Spotify,
            name: model.name,
            artist_name: join_artists(&model.artists),
            image_url: None,
        }
    }

    fn album_to_domain(model: SpotifyAlbumData) -> Album {
        Album {
            source_id: model.id,
            source: Source::Spotify,
            name: model.name,
            artist_name: join_artists(&model.artists),
            tracks_count: model.total_tracks,
            image_url: model
                .images
                .and_then(|images| images.into_iter().next().map(|i| i.url)),
        }
    }

    async fn search_album_id(
        &self,
        access_token: &str,
        name: &str,
        artist: &str,
    ) -> Result<String, ProviderError> {
        let response = self
            .api
            .get(
                "/v1/search",
                access_token,
                &[
                    ("q", format!("{artist} {name}")),
                    ("type", "album".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        let albums = response
            .get("albums")
            .cloned()
            .ok_or_else(|| ProviderError::invalid_response("search response missing `albums`"))?;
        let mut found: Vec<SpotifyAlbumData> = Self::split_page(albums)?;
        Ok(found.remove(0).id)
    }
}

fn join_artists(artists: &[SpotifyArtist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl ProviderClient for SpotifyClient {
    fn source(&self) -> Source {
        Source::Spotify
    }

    fn authorize_url(&self) -> String {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", SCOPE)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", &state)
            .finish();
        format!("{}/authorize?{}", self.accounts_base, query)
    }

    async fn list_playlists(&self, token: &Token) -> Result<Vec<Playlist>, ProviderError> {
        let access = Self::access(token)?;
        let playlists: Vec<SpotifyPlaylist> =
            self.list_page("/v1/me/playlists", &access, &[]).await?;
        Ok(playlists.into_iter().map(Self::playlist_to_domain).collect())
    }

    async fn list_albums(&self, token: &Token) -> Result<Vec<Album>, ProviderError> {
        let access = Self::access(token)?;
        let albums: Vec<SpotifySavedAlbum> = self.list_page("/v1/me/albums", &access, &[]).await?;
        Ok(albums
            .into_iter()
            .map(|saved| Self::album_to_domain(saved.album))
            .collect())
    }

    async fn list_playlist_tracks(
        &self,
        token: &Token,
        playlist_id: &str,
    ) -> Result<Vec<Track>, ProviderError> {
        let access = Self::access(token)?;
        let items: Vec<SpotifyTrackItem> = self
            .list_page(&format!("/v1/playlists/{playlist_id}/tracks"), &access, &[])
            .await?;
        Ok(items
            .into_iter()
            .map(|item| Self::track_to_domain(item.track))
            .collect())
    }

    async fn list_favorite_tracks(&self, token: &Token) -> Result<Vec<Track>, ProviderError> {
        let access = Self::access(token)?;
        let items: Vec<SpotifyTrackItem> = self.list_page("/v1/me/tracks", &access, &[]).await?;
        Ok(items
            .into_iter()
            .map(|item| Self::track_to_domain(item.track))
            .collect())
    }

    async fn create_playlist(
        &self,
        token: &Token,
        name: &str,
    ) -> Result<Playlist, ProviderError> {
        let access = Self::access(token)?;
        let user = self.current_user(&access).await?;
        let response = self
            .api
            .post_json(
                &format!("/v1/users/{}/playlists", user.id),
                &access,
                &json!({ "name": name }),
            )
            .await?;
        let playlist: SpotifyPlaylist = parse_shape(response)?;
        Ok(Self::playlist_to_domain(playlist))
    }

    async fn add_album(
        &self,
        token: &Token,
        album_name: &str,
        artist_name: &str,
    ) -> Result<(), ProviderError> {
        let access = Self::access(token)?;
        let album_id = self.search_album_id(&access, album_name, artist_name).await?;
        self.api
            .put_json("/v1/me/albums", &access, &json!({ "ids": [album_id] }))
            .await?;
        Ok(())
    }

    async fn add_tracks_to_playlist(
        &self,
        token: &Token,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        let access = Self::access(token)?;
        self.api
            .post_json(
                &format!("/v1/playlists/{playlist_id}/tracks"),
                &access,
                &json!({ "uris": track_ids }),
            )
            .await?;
        Ok(())
    }

    async fn search_track(
        &self,
        token: &Token,
        name: &str,
        artist: &str,
    ) -> Result<String, ProviderError> {
        let access = Self::access(token)?;
        let response = self
            .api
            .get(
                "/v1/search",
                &access,
                &[
                    ("q", format!("{name} {artist}")),
                    ("type", "track".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        let tracks = response
            .get("tracks")
            .cloned()
            .ok_or_else(|| ProviderError::invalid_response("search response missing `tracks`"))?;
        let mut found: Vec<SpotifyTrackData> = Self::split_page(tracks)?;
        // Spotify's batch-add endpoint takes URIs, not bare ids
        Ok(found.remove(0).uri)
    }

    async fn validate_or_refresh_token(&self, raw: &str) -> Result<Token, ProviderError> {
        let token = Self::parse_token(raw)?;
        match self.current_user(&token.access_token).await {
            Ok(_) => Self::to_blob(&token),
            Err(ProviderError::Unauthorized) => {
                let refreshed = self.refresh(&token).await?;
                debug!(source = %Source::Spotify, "refreshed expired access token");
                Self::to_blob(&refreshed)
            }
            Err(err) => Err(err),
        }
    }
}
