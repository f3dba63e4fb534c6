//! SourceToken entity model
//!
//! SeaORM entity for the source_tokens table, which stores one serialized
//! provider credential per (user_id, app_bundle, source). Repeat connects
//! and refreshes overwrite the blob in place; no history is kept.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "source_tokens")]
pub struct Model {
    /// Unique identifier for the token row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user identifier
    pub user_id: String,

    /// Owning application bundle
    pub app_bundle: String,

    /// Provider slug this credential belongs to
    pub source: String,

    /// Serialized opaque token blob; never logged in cleartext
    pub token_data: String,

    /// Timestamp when the token row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the token row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
