//! Inbound request authentication.
//!
//! Every endpoint requires a static `Api-Token` header matching the
//! configured value. The marker extractor keeps handlers declarative.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::config::AppConfig;
use crate::error::ApiError;

pub const API_TOKEN_HEADER: &str = "api-token";

/// Marker type for authenticated requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTokenAuth;

impl<S> FromRequestParts<S> for ApiTokenAuth
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);

        // Empty configured token means auth is disabled (local profile)
        if config.api_token.is_empty() {
            return Ok(ApiTokenAuth);
        }

        let presented = parts
            .headers
            .get(API_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        match presented {
            Some(token) if token == config.api_token => Ok(ApiTokenAuth),
            _ => Err(ApiError::unauthorized("Unauthorized")),
        }
    }
}
