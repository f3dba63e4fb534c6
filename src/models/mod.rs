//! # Data Models
//!
//! This module contains the SeaORM entities used throughout the trackshift API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod source_token;
pub mod transfer;

pub use source_token::Entity as SourceToken;
pub use transfer::Entity as Transfer;
pub use transfer::TransferStatus;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "trackshift".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
