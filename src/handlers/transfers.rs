//! # Transfer handlers
//!
//! The create endpoints insert a queued row, respond with the handle, and
//! detach the executor run; the caller polls `GET /{transfer_id}` for the
//! outcome.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ApiTokenAuth;
use crate::error::ApiError;
use crate::executor::{AlbumTransferRequest, PlaylistTransferRequest, TransferExecutor};
use crate::models::transfer;
use crate::providers::Source;
use crate::repositories::{NewTransfer, SqlUnitOfWork, TransferUnitOfWork};
use crate::server::AppState;

/// Request body for starting a playlist transfer
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferPlaylistRequest {
    pub user_id: String,
    pub app_bundle: String,
    pub from_source: Source,
    pub to_source: Source,
    pub playlist_id: String,
}

/// Request body for starting an album transfer
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferAlbumRequest {
    pub user_id: String,
    pub app_bundle: String,
    pub from_source: Source,
    pub to_source: Source,
    pub album_id: String,
}

/// Transfer job representation returned to callers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferRead {
    /// Job handle to poll
    pub id: Uuid,
    /// Current job status
    #[schema(example = "queued")]
    pub status: String,
    /// Captured error text, present only after a failed run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Serialized description of what was created, present once finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub user_id: String,
    pub app_bundle: String,
}

impl From<transfer::Model> for TransferRead {
    fn from(model: transfer::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            error: model.error,
            result: model.result,
            user_id: model.user_id,
            app_bundle: model.app_bundle,
        }
    }
}

/// Queue a playlist transfer and schedule its run
#[utoipa::path(
    post,
    path = "/playlist",
    request_body = TransferPlaylistRequest,
    responses(
        (status = 200, description = "Transfer queued", body = TransferRead),
        (status = 400, description = "Unknown provider", body = ApiError),
        (status = 401, description = "Missing or invalid Api-Token header", body = ApiError)
    ),
    tag = "transfers"
)]
pub async fn start_playlist_transfer(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Json(body): Json<TransferPlaylistRequest>,
) -> Result<Json<TransferRead>, ApiError> {
    let from_client = state.registry.get(body.from_source)?;
    let to_client = state.registry.get(body.to_source)?;

    let uow: Arc<dyn TransferUnitOfWork> = Arc::new(SqlUnitOfWork::new(state.db.clone()));
    let created = uow
        .create_transfer(NewTransfer {
            user_id: body.user_id.clone(),
            app_bundle: body.app_bundle.clone(),
            from_source: body.from_source,
            to_source: body.to_source,
        })
        .await?;
    uow.commit().await?;

    // The row is durable; the run proceeds independently of this response
    TransferExecutor::new(from_client, to_client, uow).spawn_playlist_run(
        created.id,
        PlaylistTransferRequest {
            user_id: body.user_id,
            app_bundle: body.app_bundle,
            from_source: body.from_source,
            to_source: body.to_source,
            playlist_id: body.playlist_id,
        },
    );

    Ok(Json(created.into()))
}

/// Queue an album transfer and schedule its run
#[utoipa::path(
    post,
    path = "/album",
    request_body = TransferAlbumRequest,
    responses(
        (status = 200, description = "Transfer queued", body = TransferRead),
        (status = 400, description = "Unknown provider", body = ApiError),
        (status = 401, description = "Missing or invalid Api-Token header", body = ApiError)
    ),
    tag = "transfers"
)]
pub async fn start_album_transfer(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Json(body): Json<TransferAlbumRequest>,
) -> Result<Json<TransferRead>, ApiError> {
    let from_client = state.registry.get(body.from_source)?;
    let to_client = state.registry.get(body.to_source)?;

    let uow: Arc<dyn TransferUnitOfWork> = Arc::new(SqlUnitOfWork::new(state.db.clone()));
    let created = uow
        .create_transfer(NewTransfer {
            user_id: body.user_id.clone(),
            app_bundle: body.app_bundle.clone(),
            from_source: body.from_source,
            to_source: body.to_source,
        })
        .await?;
    uow.commit().await?;

    TransferExecutor::new(from_client, to_client, uow).spawn_album_run(
        created.id,
        AlbumTransferRequest {
            user_id: body.user_id,
            app_bundle: body.app_bundle,
            from_source: body.from_source,
            to_source: body.to_source,
            album_id: body.album_id,
        },
    );

    Ok(Json(created.into()))
}

/// Poll a transfer's current status
#[utoipa::path(
    get,
    path = "/{transfer_id}",
    params(
        ("transfer_id" = Uuid, Path, description = "Transfer job handle")
    ),
    responses(
        (status = 200, description = "Transfer state", body = TransferRead),
        (status = 401, description = "Missing or invalid Api-Token header", body = ApiError),
        (status = 404, description = "Unknown transfer id", body = ApiError)
    ),
    tag = "transfers"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    _auth: ApiTokenAuth,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<TransferRead>, ApiError> {
    let uow = SqlUnitOfWork::new(state.db.clone());
    let found = uow.get_transfer(transfer_id).await?;
    uow.rollback().await?;
    Ok(Json(found.into()))
}
