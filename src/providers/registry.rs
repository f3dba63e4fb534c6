//! Provider registry
//!
//! Data-driven mapping from [`Source`] to a constructed client. Provider
//! configuration (base URLs, credentials) is injected from [`AppConfig`] at
//! startup; nothing is resolved through globals.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::spotify::{SpotifyClient, SpotifyConfig};
use crate::providers::trait_::ProviderClient;
use crate::providers::types::Source;
use crate::providers::youtube::{YoutubeClient, YoutubeConfig};

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("provider '{provider}' is not registered")]
    ProviderNotRegistered { provider: Source },
}

/// Registry of constructed provider clients.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<Source, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full registry from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(SpotifyClient::new(SpotifyConfig {
            api_base: config.spotify_api_base.clone(),
            accounts_base: config.spotify_accounts_base.clone(),
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.oauth_redirect_uri.clone(),
        })));

        registry.register(Arc::new(YoutubeClient::new(YoutubeConfig {
            api_base: config.youtube_api_base.clone(),
            oauth_token_url: config.youtube_oauth_token_url.clone(),
            auth_base: config.youtube_auth_base.clone(),
            client_id: config.youtube_client_id.clone(),
            client_secret: config.youtube_client_secret.clone(),
            redirect_uri: config.oauth_redirect_uri.clone(),
        })));

        registry
    }

    /// Register a client under its own source.
    pub fn register(&mut self, client: Arc<dyn ProviderClient>) {
        self.clients.insert(client.source(), client);
    }

    pub fn get(&self, source: Source) -> Result<Arc<dyn ProviderClient>, RegistryError> {
        self.clients
            .get(&source)
            .cloned()
            .ok_or(RegistryError::ProviderNotRegistered { provider: source })
    }

    /// Registered sources, sorted by slug for stable listings.
    pub fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<_> = self.clients.keys().copied().collect();
        sources.sort_by_key(|s| s.as_str());
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_unknown_provider() {
        let registry = ProviderRegistry::new();
        let result = registry.get(Source::Spotify);
        assert!(matches!(
            result.err(),
            Some(RegistryError::ProviderNotRegistered {
                provider: Source::Spotify
            })
        ));
    }

    #[test]
    fn test_registry_from_config_registers_both_providers() {
        let registry = ProviderRegistry::from_config(&AppConfig::default());
        assert!(registry.get(Source::Spotify).is_ok());
        assert!(registry.get(Source::Youtube).is_ok());
        assert_eq!(registry.sources(), vec![Source::Spotify, Source::Youtube]);
    }

    #[test]
    fn test_registered_client_keeps_its_source() {
        let registry = ProviderRegistry::from_config(&AppConfig::default());
        let client = registry.get(Source::Youtube).unwrap();
        assert_eq!(client.source(), Source::Youtube);
    }
}
