//! # Credential lifecycle manager
//!
//! Resolves the usable token for a (user, app, provider) triple: load the
//! persisted blob, let the provider validate or refresh it, then write the
//! result back unconditionally so the stored row is always the latest
//! known-good token, even when the refresh happened on another call path.

use metrics::counter;
use tracing::{debug, instrument};

use crate::error::TransferError;
use crate::providers::{ProviderClient, Token};
use crate::repositories::{StoreError, TransferUnitOfWork};

/// Load, validate/refresh, and persist the token for one provider.
///
/// The overwrite-and-commit happens before the token is returned to the
/// caller; concurrent resolutions of the same row are not synchronized and
/// the last write wins.
#[instrument(skip_all, fields(source = %client.source(), user_id = %user_id))]
pub async fn resolve_token(
    uow: &dyn TransferUnitOfWork,
    client: &dyn ProviderClient,
    user_id: &str,
    app_bundle: &str,
) -> Result<Token, TransferError> {
    let source = client.source();

    let record = match uow.get_source_token(user_id, app_bundle, source).await {
        Ok(record) => record,
        Err(StoreError::NotFound) => {
            counter!("token_resolve_not_connected_total").increment(1);
            return Err(TransferError::SourceNotConnected(source));
        }
        Err(err) => return Err(err.into()),
    };

    let token = client.validate_or_refresh_token(&record.token_data).await?;

    uow.update_source_token(user_id, app_bundle, source, token.blob())
        .await?;
    uow.commit().await?;

    let metric_labels = vec![("source", source.as_str().to_string())];
    counter!("token_resolve_total", &metric_labels).increment(1);
    debug!("resolved and persisted provider token");

    Ok(token)
}
