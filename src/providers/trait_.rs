//! Provider client trait definition
//!
//! Defines the standard interface that all provider client implementations
//! must follow, and the error kinds callers pattern-match on.

use async_trait::async_trait;

use crate::providers::types::{Album, Playlist, Source, Token, Track};

/// Provider-specific error kinds for structured error handling.
///
/// Capability gaps and empty reads are typed outcomes here, not crashes:
/// listing handlers and transfer runs match on the kind to decide the
/// caller-facing mapping.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The provider has no concept backing this operation (e.g. a
    /// video-sharing provider has no album library). Expected outcome.
    #[error("{provider} does not support {operation}")]
    NotSupported {
        provider: Source,
        operation: &'static str,
    },
    /// A read/list operation returned zero items.
    #[error("provider returned no items")]
    EmptyResponse,
    /// The response did not match the expected provider shape.
    #[error("invalid provider response: {detail}")]
    InvalidResponse { detail: String },
    /// The provider rejected the credential (HTTP 401).
    #[error("provider rejected credentials")]
    Unauthorized,
    /// Any other non-2xx provider answer.
    #[error("provider request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },
    /// Connection-level failure before an HTTP status was available.
    #[error("provider transport error: {detail}")]
    Transport { detail: String },
    /// The persisted blob does not parse into this provider's token shape.
    #[error("invalid token payload: {detail}")]
    InvalidToken { detail: String },
}

impl ProviderError {
    pub fn invalid_response<S: Into<String>>(detail: S) -> Self {
        ProviderError::InvalidResponse {
            detail: detail.into(),
        }
    }

    pub fn not_supported(source: Source, operation: &'static str) -> Self {
        ProviderError::NotSupported { provider: source, operation }
    }
}

/// Contract every streaming provider integration implements.
///
/// All operations take the opaque [`Token`]; implementations parse it into
/// their concrete token type at the boundary. Read operations fail with
/// [`ProviderError::EmptyResponse`] on zero items rather than returning an
/// empty collection.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// The provider this client speaks to.
    fn source(&self) -> Source;

    /// OAuth consent URL for connecting this provider.
    fn authorize_url(&self) -> String;

    async fn list_playlists(&self, token: &Token) -> Result<Vec<Playlist>, ProviderError>;

    async fn list_albums(&self, token: &Token) -> Result<Vec<Album>, ProviderError>;

    async fn list_playlist_tracks(
        &self,
        token: &Token,
        playlist_id: &str,
    ) -> Result<Vec<Track>, ProviderError>;

    async fn list_favorite_tracks(&self, token: &Token) -> Result<Vec<Track>, ProviderError>;

    /// Create an empty playlist on the provider and return its normalized
    /// representation.
    async fn create_playlist(&self, token: &Token, name: &str)
    -> Result<Playlist, ProviderError>;

    /// Locate an equivalent album by name/artist and save it to the user's
    /// library.
    async fn add_album(
        &self,
        token: &Token,
        album_name: &str,
        artist_name: &str,
    ) -> Result<(), ProviderError>;

    async fn add_tracks_to_playlist(
        &self,
        token: &Token,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), ProviderError>;

    /// Resolve a track to this provider's native id by (name, artist).
    async fn search_track(
        &self,
        token: &Token,
        name: &str,
        artist: &str,
    ) -> Result<String, ProviderError>;

    /// Parse the persisted blob, probe it with a cheap authenticated call,
    /// and run the provider's refresh flow if the probe reports 401.
    ///
    /// Idempotent for already-valid tokens: the returned token equals the
    /// input.
    async fn validate_or_refresh_token(&self, raw: &str) -> Result<Token, ProviderError>;
}
