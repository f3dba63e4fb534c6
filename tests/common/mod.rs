//! Shared test doubles and helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::Mutex;
use uuid::Uuid;

use migration::MigratorTrait;
use trackshift::config::AppConfig;
use trackshift::models::transfer::TransferStatus;
use trackshift::models::{source_token, transfer};
use trackshift::providers::types::{Album, Playlist, Source, Token, Track};
use trackshift::providers::{ProviderClient, ProviderError, ProviderRegistry};
use trackshift::repositories::{
    NewSourceToken, NewTransfer, StoreError, TransferPatch, TransferUnitOfWork,
};
use trackshift::server::{AppState, create_app};

/// Mutation calls observed by a mock provider client.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    CreatePlaylist { name: String },
    AddTracks { playlist_id: String, track_ids: Vec<String> },
    AddAlbum { name: String, artist: String },
}

/// Scripted provider client double.
///
/// Reads come from the configured collections (empty collection reproduces
/// the provider's `EmptyResponse` contract); `None` collections report
/// `NotSupported`. Every mutation is recorded for assertions.
pub struct MockProviderClient {
    pub source: Source,
    pub playlists: Vec<Playlist>,
    pub albums: Option<Vec<Album>>,
    pub playlist_tracks: HashMap<String, Vec<Track>>,
    pub favorite_tracks: Option<Vec<Track>>,
    /// (track name, artist) -> destination-native id
    pub search_results: HashMap<(String, String), String>,
    pub created_playlist: Option<Playlist>,
    /// When set, validate_or_refresh_token returns this blob instead of
    /// the input, simulating a refresh.
    pub refreshed_blob: Option<String>,
    pub calls: Mutex<Vec<ProviderCall>>,
}

impl MockProviderClient {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            playlists: Vec::new(),
            albums: Some(Vec::new()),
            playlist_tracks: HashMap::new(),
            favorite_tracks: Some(Vec::new()),
            search_results: HashMap::new(),
            created_playlist: None,
            refreshed_blob: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_albums(mut self) -> Self {
        self.albums = None;
        self
    }

    pub async fn recorded_calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    fn non_empty<T: Clone>(items: &[T]) -> Result<Vec<T>, ProviderError> {
        if items.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(items.to_vec())
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    fn source(&self) -> Source {
        self.source
    }

    fn authorize_url(&self) -> String {
        format!("https://auth.example/{}", self.source)
    }

    async fn list_playlists(&self, _token: &Token) -> Result<Vec<Playlist>, ProviderError> {
        Self::non_empty(&self.playlists)
    }

    async fn list_albums(&self, _token: &Token) -> Result<Vec<Album>, ProviderError> {
        match &self.albums {
            Some(albums) => Self::non_empty(albums),
            None => Err(ProviderError::not_supported(self.source, "list_albums")),
        }
    }

    async fn list_playlist_tracks(
        &self,
        _token: &Token,
        playlist_id: &str,
    ) -> Result<Vec<Track>, ProviderError> {
        match self.playlist_tracks.get(playlist_id) {
            Some(tracks) => Self::non_empty(tracks),
            None => Err(ProviderError::EmptyResponse),
        }
    }

    async fn list_favorite_tracks(&self, _token: &Token) -> Result<Vec<Track>, ProviderError> {
        match &self.favorite_tracks {
            Some(tracks) => Self::non_empty(tracks),
            None => Err(ProviderError::not_supported(
                self.source,
                "list_favorite_tracks",
            )),
        }
    }

    async fn create_playlist(
        &self,
        _token: &Token,
        name: &str,
    ) -> Result<Playlist, ProviderError> {
        self.calls.lock().await.push(ProviderCall::CreatePlaylist {
            name: name.to_string(),
        });
        self.created_playlist
            .clone()
            .ok_or(ProviderError::not_supported(self.source, "create_playlist"))
    }

    async fn add_album(
        &self,
        _token: &Token,
        album_name: &str,
        artist_name: &str,
    ) -> Result<(), ProviderError> {
        if self.albums.is_none() {
            return Err(ProviderError::not_supported(self.source, "add_album"));
        }
        self.calls.lock().await.push(ProviderCall::AddAlbum {
            name: album_name.to_string(),
            artist: artist_name.to_string(),
        });
        Ok(())
    }

    async fn add_tracks_to_playlist(
        &self,
        _token: &Token,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError> {
        self.calls.lock().await.push(ProviderCall::AddTracks {
            playlist_id: playlist_id.to_string(),
            track_ids: track_ids.to_vec(),
        });
        Ok(())
    }

    async fn search_track(
        &self,
        _token: &Token,
        name: &str,
        artist: &str,
    ) -> Result<String, ProviderError> {
        self.search_results
            .get(&(name.to_string(), artist.to_string()))
            .cloned()
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn validate_or_refresh_token(&self, raw: &str) -> Result<Token, ProviderError> {
        match &self.refreshed_blob {
            Some(blob) => Ok(Token::from_blob(blob.clone())),
            None => Ok(Token::from_blob(raw)),
        }
    }
}

/// In-memory unit of work double.
///
/// Mirrors the SQL implementation's contract, including the state-machine
/// check: a status write a terminal row does not admit is rejected.
#[derive(Default)]
pub struct InMemoryUow {
    transfers: Mutex<HashMap<Uuid, transfer::Model>>,
    tokens: Mutex<HashMap<(String, String, String), source_token::Model>>,
    commits: Mutex<u64>,
}

impl InMemoryUow {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_token(&self, user_id: &str, app_bundle: &str, source: Source, blob: &str) {
        let now = Utc::now().fixed_offset();
        self.tokens.lock().await.insert(
            (
                user_id.to_string(),
                app_bundle.to_string(),
                source.as_str().to_string(),
            ),
            source_token::Model {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                app_bundle: app_bundle.to_string(),
                source: source.as_str().to_string(),
                token_data: blob.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub async fn token_blob(&self, user_id: &str, app_bundle: &str, source: Source) -> Option<String> {
        self.tokens
            .lock()
            .await
            .get(&(
                user_id.to_string(),
                app_bundle.to_string(),
                source.as_str().to_string(),
            ))
            .map(|row| row.token_data.clone())
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.lock().await.len()
    }

    pub async fn commit_count(&self) -> u64 {
        *self.commits.lock().await
    }
}

#[async_trait]
impl TransferUnitOfWork for InMemoryUow {
    async fn get_transfer(&self, id: Uuid) -> Result<transfer::Model, StoreError> {
        self.transfers
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_transfer(&self, new: NewTransfer) -> Result<transfer::Model, StoreError> {
        let now = Utc::now().fixed_offset();
        let row = transfer::Model {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            app_bundle: new.app_bundle,
            from_source: new.from_source.as_str().to_string(),
            to_source: new.to_source.as_str().to_string(),
            status: TransferStatus::Queued.as_str().to_string(),
            error: None,
            result: None,
            created_at: now,
            updated_at: now,
        };
        self.transfers.lock().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_transfer(
        &self,
        id: Uuid,
        patch: TransferPatch,
    ) -> Result<transfer::Model, StoreError> {
        let mut transfers = self.transfers.lock().await;
        let row = transfers.get_mut(&id).ok_or(StoreError::NotFound)?;

        if let Some(next) = patch.status {
            let from = TransferStatus::parse(&row.status)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{}'", row.status)))?;
            if !from.can_transition(next) {
                return Err(StoreError::InvalidTransition { from, to: next });
            }
            row.status = next.as_str().to_string();
        }
        if let Some(error) = patch.error {
            row.error = Some(error);
        }
        if let Some(result) = patch.result {
            row.result = Some(result);
        }
        row.updated_at = Utc::now().fixed_offset();

        Ok(row.clone())
    }

    async fn get_source_token(
        &self,
        user_id: &str,
        app_bundle: &str,
        source: Source,
    ) -> Result<source_token::Model, StoreError> {
        self.tokens
            .lock()
            .await
            .get(&(
                user_id.to_string(),
                app_bundle.to_string(),
                source.as_str().to_string(),
            ))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn upsert_source_token(
        &self,
        new: NewSourceToken,
    ) -> Result<source_token::Model, StoreError> {
        let key = (
            new.user_id.clone(),
            new.app_bundle.clone(),
            new.source.as_str().to_string(),
        );
        let now = Utc::now().fixed_offset();
        let mut tokens = self.tokens.lock().await;
        let row = tokens
            .entry(key)
            .and_modify(|row| {
                row.token_data = new.token_data.clone();
                row.updated_at = now;
            })
            .or_insert_with(|| source_token::Model {
                id: Uuid::new_v4(),
                user_id: new.user_id.clone(),
                app_bundle: new.app_bundle.clone(),
                source: new.source.as_str().to_string(),
                token_data: new.token_data.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(row.clone())
    }

    async fn update_source_token(
        &self,
        user_id: &str,
        app_bundle: &str,
        source: Source,
        token_data: &str,
    ) -> Result<source_token::Model, StoreError> {
        let mut tokens = self.tokens.lock().await;
        let row = tokens
            .get_mut(&(
                user_id.to_string(),
                app_bundle.to_string(),
                source.as_str().to_string(),
            ))
            .ok_or(StoreError::NotFound)?;
        row.token_data = token_data.to_string();
        row.updated_at = Utc::now().fixed_offset();
        Ok(row.clone())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        *self.commits.lock().await += 1;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Convenience constructors for fixture entities.
pub fn track(source: Source, id: &str, name: &str, artist: &str) -> Track {
    Track {
        source_id: id.to_string(),
        source,
        name: name.to_string(),
        artist_name: artist.to_string(),
        image_url: None,
    }
}

pub fn playlist(source: Source, id: &str, name: &str) -> Playlist {
    Playlist {
        source_id: id.to_string(),
        source,
        name: name.to_string(),
        url: None,
        tracks_count: None,
        image_url: None,
    }
}

pub fn album(source: Source, id: &str, name: &str, artist: &str) -> Album {
    Album {
        source_id: id.to_string(),
        source,
        name: name.to_string(),
        artist_name: artist.to_string(),
        tracks_count: None,
        image_url: None,
    }
}

pub const TEST_API_TOKEN: &str = "test-api-token";

/// Fresh sqlite-in-memory database with migrations applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // One connection so the in-memory database is shared by every query
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("failed to open sqlite in-memory database");
    migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    db
}

/// Spawn the full axum app on an ephemeral port, backed by the given
/// registry and a fresh sqlite database. Returns (base_url, db).
pub async fn spawn_app(registry: ProviderRegistry) -> (String, DatabaseConnection) {
    let db = setup_test_db().await;

    let config = AppConfig {
        profile: "test".to_string(),
        api_token: TEST_API_TOKEN.to_string(),
        ..AppConfig::default()
    };

    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
        registry: Arc::new(registry),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}", addr), db)
}
