//! Provider client implementations and the shared contract.

pub mod http;
pub mod registry;
pub mod spotify;
pub mod trait_;
pub mod types;
pub mod youtube;

pub use registry::{ProviderRegistry, RegistryError};
pub use trait_::{ProviderClient, ProviderError};
pub use types::{Album, Playlist, Source, Token, Track};
