//! Normalized music entities
//!
//! The common currency every provider client produces and consumes. A
//! provider-native id is opaque outside the provider that minted it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of supported streaming providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Spotify,
    Youtube,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Spotify => "spotify",
            Source::Youtube => "youtube",
        }
    }

    /// Parse a stored source slug back into the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "spotify" => Some(Source::Spotify),
            "youtube" => Some(Source::Youtube),
            _ => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque provider credential.
///
/// The core only ever moves the serialized blob between storage and the
/// owning provider client; each client parses it into its concrete token
/// shape internally. The blob is never logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    blob: String,
}

impl Token {
    pub fn from_blob<S: Into<String>>(blob: S) -> Self {
        Self { blob: blob.into() }
    }

    pub fn blob(&self) -> &str {
        &self.blob
    }
}

/// A user playlist, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub source_id: String,
    pub source: Source,
    pub name: String,
    pub url: Option<String>,
    pub tracks_count: Option<u64>,
    pub image_url: Option<String>,
}

/// A saved album, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub source_id: String,
    pub source: Source,
    pub name: String,
    pub artist_name: String,
    pub tracks_count: Option<u64>,
    pub image_url: Option<String>,
}

/// A single track, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub source_id: String,
    pub source: Source,
    pub name: String,
    pub artist_name: String,
    pub image_url: Option<String>,
}
