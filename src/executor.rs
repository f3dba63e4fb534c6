//! # Transfer executor
//!
//! Drives one transfer job end to end: advance the state machine, resolve
//! both credentials, read from the source provider, write to the
//! destination provider. Runs are spawned fire-and-forget from the create
//! handlers; a failed run records its error on the row and must never take
//! the process down.

use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::TransferError;
use crate::models::transfer::TransferStatus;
use crate::providers::types::{Album, Playlist, Source};
use crate::providers::ProviderClient;
use crate::repositories::{TransferPatch, TransferUnitOfWork};
use crate::token_manager::resolve_token;

/// Request payload for a playlist run, captured at creation time.
#[derive(Debug, Clone)]
pub struct PlaylistTransferRequest {
    pub user_id: String,
    pub app_bundle: String,
    pub from_source: Source,
    pub to_source: Source,
    pub playlist_id: String,
}

/// Request payload for an album run, captured at creation time.
#[derive(Debug, Clone)]
pub struct AlbumTransferRequest {
    pub user_id: String,
    pub app_bundle: String,
    pub from_source: Source,
    pub to_source: Source,
    pub album_id: String,
}

/// One executor per run, bound to the source and destination clients.
pub struct TransferExecutor {
    from_client: Arc<dyn ProviderClient>,
    to_client: Arc<dyn ProviderClient>,
    uow: Arc<dyn TransferUnitOfWork>,
}

impl TransferExecutor {
    pub fn new(
        from_client: Arc<dyn ProviderClient>,
        to_client: Arc<dyn ProviderClient>,
        uow: Arc<dyn TransferUnitOfWork>,
    ) -> Self {
        Self {
            from_client,
            to_client,
            uow,
        }
    }

    /// Detach a playlist run onto the runtime.
    pub fn spawn_playlist_run(self, transfer_id: Uuid, request: PlaylistTransferRequest) {
        tokio::spawn(async move {
            if let Err(err) = self.run_playlist_transfer(transfer_id, request).await {
                error!(%transfer_id, error = %err, "playlist transfer run failed");
            }
        });
    }

    /// Detach an album run onto the runtime.
    pub fn spawn_album_run(self, transfer_id: Uuid, request: AlbumTransferRequest) {
        tokio::spawn(async move {
            if let Err(err) = self.run_album_transfer(transfer_id, request).await {
                error!(%transfer_id, error = %err, "album transfer run failed");
            }
        });
    }

    /// Copy one playlist across providers.
    ///
    /// Whole-job abort on first error: nothing already written to the
    /// destination is undone, and the error text lands on the row before
    /// the run re-surfaces it.
    #[instrument(skip_all, fields(transfer_id = %transfer_id, playlist_id = %request.playlist_id))]
    pub async fn run_playlist_transfer(
        &self,
        transfer_id: Uuid,
        request: PlaylistTransferRequest,
    ) -> Result<(), TransferError> {
        info!(
            from_source = %request.from_source,
            to_source = %request.to_source,
            "started playlist transfer"
        );
        let run_started = std::time::Instant::now();
        self.set_status(transfer_id, TransferStatus::Started, None, None)
            .await?;

        match self.copy_playlist(&request).await {
            Ok(created) => {
                self.set_status(
                    transfer_id,
                    TransferStatus::Finished,
                    None,
                    Some(serialize_result(&created)),
                )
                .await?;
                histogram!("transfer_run_duration_ms", &vec![("kind", "playlist".to_string())])
                    .record(run_started.elapsed().as_secs_f64() * 1_000.0);
                counter!("transfer_runs_finished_total", &vec![("kind", "playlist".to_string())]).increment(1);
                info!(new_playlist_id = %created.source_id, "finished playlist transfer");
                Ok(())
            }
            Err(err) => {
                counter!("transfer_runs_failed_total", &vec![("kind", "playlist".to_string())]).increment(1);
                self.record_failure(transfer_id, &err).await;
                Err(err)
            }
        }
    }

    /// Copy one saved album across providers.
    #[instrument(skip_all, fields(transfer_id = %transfer_id, album_id = %request.album_id))]
    pub async fn run_album_transfer(
        &self,
        transfer_id: Uuid,
        request: AlbumTransferRequest,
    ) -> Result<(), TransferError> {
        info!(
            from_source = %request.from_source,
            to_source = %request.to_source,
            "started album transfer"
        );
        let run_started = std::time::Instant::now();
        self.set_status(transfer_id, TransferStatus::Started, None, None)
            .await?;

        match self.copy_album(&request).await {
            Ok(album) => {
                self.set_status(
                    transfer_id,
                    TransferStatus::Finished,
                    None,
                    Some(serialize_result(&album)),
                )
                .await?;
                histogram!("transfer_run_duration_ms", &vec![("kind", "album".to_string())])
                    .record(run_started.elapsed().as_secs_f64() * 1_000.0);
                counter!("transfer_runs_finished_total", &vec![("kind", "album".to_string())]).increment(1);
                info!(album = %album.name, "finished album transfer");
                Ok(())
            }
            Err(err) => {
                counter!("transfer_runs_failed_total", &vec![("kind", "album".to_string())]).increment(1);
                self.record_failure(transfer_id, &err).await;
                Err(err)
            }
        }
    }

    async fn copy_playlist(
        &self,
        request: &PlaylistTransferRequest,
    ) -> Result<Playlist, TransferError> {
        let from_token = resolve_token(
            self.uow.as_ref(),
            self.from_client.as_ref(),
            &request.user_id,
            &request.app_bundle,
        )
        .await?;
        let to_token = resolve_token(
            self.uow.as_ref(),
            self.to_client.as_ref(),
            &request.user_id,
            &request.app_bundle,
        )
        .await?;

        let tracks = self
            .from_client
            .list_playlist_tracks(&from_token, &request.playlist_id)
            .await?;

        let name = format!("Transferred {}", Utc::now().date_naive());
        let created = self.to_client.create_playlist(&to_token, &name).await?;

        let mut resolved = Vec::with_capacity(tracks.len());
        for track in &tracks {
            let destination_id = self
                .to_client
                .search_track(&to_token, &track.name, &track.artist_name)
                .await?;
            resolved.push(destination_id);
        }

        self.to_client
            .add_tracks_to_playlist(&to_token, &created.source_id, &resolved)
            .await?;

        Ok(created)
    }

    async fn copy_album(&self, request: &AlbumTransferRequest) -> Result<Album, TransferError> {
        let from_token = resolve_token(
            self.uow.as_ref(),
            self.from_client.as_ref(),
            &request.user_id,
            &request.app_bundle,
        )
        .await?;
        let to_token = resolve_token(
            self.uow.as_ref(),
            self.to_client.as_ref(),
            &request.user_id,
            &request.app_bundle,
        )
        .await?;

        // Providers expose no get-by-id for saved albums; scan the library
        let albums = self.from_client.list_albums(&from_token).await?;
        let album = albums
            .into_iter()
            .find(|album| album.source_id == request.album_id)
            .ok_or_else(|| TransferError::AlbumNotFound(request.album_id.clone()))?;

        self.to_client
            .add_album(&to_token, &album.name, &album.artist_name)
            .await?;

        Ok(album)
    }

    /// Capture the error text on the row before the terminal transition.
    /// A failure to record must not mask the original error.
    async fn record_failure(&self, transfer_id: Uuid, err: &TransferError) {
        if let Err(store_err) = self
            .set_status(
                transfer_id,
                TransferStatus::Failed,
                Some(err.to_string()),
                None,
            )
            .await
        {
            error!(%transfer_id, error = %store_err, "failed to record transfer failure");
        }
    }

    /// Commit a status transition before the next work step executes, so a
    /// mid-run observer always sees a status consistent with real progress.
    async fn set_status(
        &self,
        transfer_id: Uuid,
        status: TransferStatus,
        error_text: Option<String>,
        result: Option<String>,
    ) -> Result<(), TransferError> {
        self.uow
            .update_transfer(
                transfer_id,
                TransferPatch {
                    status: Some(status),
                    error: error_text,
                    result,
                },
            )
            .await?;
        self.uow.commit().await?;
        Ok(())
    }
}

fn serialize_result<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
