//! # Source connection handlers
//!
//! Connecting a source stores its credential pair as one SourceToken row;
//! repeat connects overwrite the row instead of accumulating history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::ApiTokenAuth;
use crate::error::ApiError;
use crate::providers::Source;
use crate::repositories::{NewSourceToken, SqlUnitOfWork, TransferUnitOfWork};
use crate::server::AppState;

/// Provider selector for single-provider endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SourceQuery {
    /// Provider to operate on (defaults to spotify)
    pub source: Option<Source>,
}

impl SourceQuery {
    pub fn source(&self) -> Source {
        self.source.unwrap_or(Source::Spotify)
    }
}

/// Request body for connecting a source
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectSourceRequest {
    pub user_id: String,
    pub app_bundle: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// OAuth authorization URL response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeLinkResponse {
    /// Complete authorization URL for user redirection
    pub authorize_url: String,
}

/// Store (or replace) a user's credential for one provider
#[utoipa::path(
    post,
    path = "/source/connect",
    params(SourceQuery),
    request_body = ConnectSourceRequest,
    responses(
        (status = 202, description = "Source token stored"),
        (status = 400, description = "Unknown provider", body = ApiError),
        (status = 401, description = "Missing or invalid Api-Token header", body = ApiError)
    ),
    tag = "source"
)]
pub async fn connect_source(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Query(query): Query<SourceQuery>,
    Json(body): Json<ConnectSourceRequest>,
) -> Result<StatusCode, ApiError> {
    let source = query.source();
    // Reject unknown providers even though the write itself needs no client
    state.registry.get(source)?;

    let token_data = json!({
        "access_token": body.access_token,
        "refresh_token": body.refresh_token,
    })
    .to_string();

    let uow = SqlUnitOfWork::new(state.db.clone());
    uow.upsert_source_token(NewSourceToken {
        user_id: body.user_id.clone(),
        app_bundle: body.app_bundle.clone(),
        source,
        token_data,
    })
    .await?;
    uow.commit().await?;

    info!(user_id = %body.user_id, %source, "source connected");

    Ok(StatusCode::ACCEPTED)
}

/// Build the provider's OAuth consent link
#[utoipa::path(
    get,
    path = "/source/authorize",
    params(SourceQuery),
    responses(
        (status = 200, description = "Authorization URL", body = AuthorizeLinkResponse),
        (status = 400, description = "Unknown provider", body = ApiError),
        (status = 401, description = "Missing or invalid Api-Token header", body = ApiError)
    ),
    tag = "source"
)]
pub async fn authorize_link(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Query(query): Query<SourceQuery>,
) -> Result<Json<AuthorizeLinkResponse>, ApiError> {
    let client = state.registry.get(query.source())?;
    Ok(Json(AuthorizeLinkResponse {
        authorize_url: client.authorize_url(),
    }))
}
