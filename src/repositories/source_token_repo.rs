//! Source token row operations.
//!
//! The (user_id, app_bundle, source) key is unique; upsert updates the
//! existing row first and only inserts when nothing was there.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::models::source_token::{ActiveModel, Column, Entity, Model};
use crate::providers::Source;
use crate::repositories::{NewSourceToken, StoreError, is_unique_violation};

pub async fn get_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    app_bundle: &str,
    source: Source,
) -> Result<Model, StoreError> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::AppBundle.eq(app_bundle))
        .filter(Column::Source.eq(source.as_str()))
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound)
}

pub async fn upsert<C: ConnectionTrait>(
    conn: &C,
    new: NewSourceToken,
) -> Result<Model, StoreError> {
    if let Some(updated) =
        overwrite(conn, &new.user_id, &new.app_bundle, new.source, &new.token_data).await?
    {
        return Ok(updated);
    }

    let now = Utc::now().fixed_offset();
    let row = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        app_bundle: Set(new.app_bundle),
        source: Set(new.source.as_str().to_string()),
        token_data: Set(new.token_data),
        created_at: Set(now),
        updated_at: Set(now),
    };

    row.insert(conn).await.map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::Conflict("source token already exists for this user".to_string())
        } else {
            StoreError::Db(e)
        }
    })
}

pub async fn update_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    app_bundle: &str,
    source: Source,
    token_data: &str,
) -> Result<Model, StoreError> {
    match overwrite(conn, user_id, app_bundle, source, token_data).await? {
        Some(updated) => Ok(updated),
        None => Err(StoreError::NotFound),
    }
}

/// Overwrite the blob of an existing row; `None` when no row matched.
async fn overwrite<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    app_bundle: &str,
    source: Source,
    token_data: &str,
) -> Result<Option<Model>, StoreError> {
    let result = Entity::update_many()
        .col_expr(Column::TokenData, Expr::value(token_data))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::AppBundle.eq(app_bundle))
        .filter(Column::Source.eq(source.as_str()))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }
    get_by_user(conn, user_id, app_bundle, source).await.map(Some)
}
