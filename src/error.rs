//! # Error Handling
//!
//! Unified error handling for the trackshift API: the run-level error the
//! orchestration layer produces, and the problem+json response shape every
//! handler maps it into.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::providers::{ProviderError, RegistryError, Source};
use crate::repositories::StoreError;

/// Error raised while resolving credentials or driving a transfer run.
///
/// Provider errors are not swallowed; they are wrapped and mapped to a
/// caller-facing category at the transport edge, and captured verbatim
/// into the transfer row when a background run fails.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("source {0} for user not connected")]
    SourceNotConnected(Source),
    #[error("album {0} not found in source library")]
    AlbumNotFound(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Correlation id for log matching
    pub correlation_id: Box<str>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            correlation_id: format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8])
                .into_boxed_str(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn validation(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );
        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(error: ProviderError) -> Self {
        match &error {
            ProviderError::NotSupported { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "NOT_SUPPORTED", &error.to_string())
            }
            ProviderError::EmptyResponse => Self::new(
                StatusCode::NOT_FOUND,
                "EMPTY_RESPONSE",
                "Source returned no items",
            ),
            ProviderError::InvalidResponse { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "INVALID_RESPONSE",
                &error.to_string(),
            ),
            ProviderError::Unauthorized => Self::new(
                StatusCode::UNAUTHORIZED,
                "RECONNECT_REQUIRED",
                "Source tokens expired. Please, connect source again",
            ),
            ProviderError::Upstream { .. }
            | ProviderError::Transport { .. }
            | ProviderError::InvalidToken { .. } => {
                tracing::error!(error = %error, "provider call failed");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    "Source request failed",
                )
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match &error {
            StoreError::NotFound => Self::not_found("Record not found"),
            StoreError::Conflict(detail) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", detail.as_str())
            }
            StoreError::InvalidTransition { .. } => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", &error.to_string())
            }
            StoreError::Corrupt(_) | StoreError::Db(_) => {
                tracing::error!(error = %error, "persistence error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "A storage error occurred",
                )
            }
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(error: TransferError) -> Self {
        match error {
            TransferError::SourceNotConnected(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "SOURCE_NOT_CONNECTED",
                "Source for user not connected",
            ),
            TransferError::AlbumNotFound(_) => Self::not_found(&error.to_string()),
            TransferError::Provider(provider) => provider.into(),
            TransferError::Store(store) => store.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        Self::validation(&error.to_string())
    }
}
