//! Transfer row operations.
//!
//! Status writes go through the state machine: a transition the machine
//! does not admit fails with `InvalidTransition` and leaves the row
//! untouched, so a terminal row can never be resurrected.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::models::transfer::{ActiveModel, Entity, Model, TransferStatus};
use crate::repositories::{NewTransfer, StoreError, TransferPatch, is_unique_violation};

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Model, StoreError> {
    Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound)
}

pub async fn create<C: ConnectionTrait>(conn: &C, new: NewTransfer) -> Result<Model, StoreError> {
    let now = Utc::now().fixed_offset();
    let row = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        app_bundle: Set(new.app_bundle),
        from_source: Set(new.from_source.as_str().to_string()),
        to_source: Set(new.to_source.as_str().to_string()),
        status: Set(TransferStatus::Queued.as_str().to_string()),
        error: Set(None),
        result: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    row.insert(conn).await.map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::Conflict("transfer can't be created".to_string())
        } else {
            StoreError::Db(e)
        }
    })
}

pub async fn update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    patch: TransferPatch,
) -> Result<Model, StoreError> {
    let current = get_by_id(conn, id).await?;

    let mut active: ActiveModel = current.clone().into();
    if let Some(next) = patch.status {
        let from = TransferStatus::parse(&current.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{}'", current.status)))?;
        if !from.can_transition(next) {
            return Err(StoreError::InvalidTransition { from, to: next });
        }
        active.status = Set(next.as_str().to_string());
    }
    if let Some(error) = patch.error {
        active.error = Set(Some(error));
    }
    if let Some(result) = patch.result {
        active.result = Set(Some(result));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    Ok(active.update(conn).await?)
}
