//! Transfer entity model
//!
//! SeaORM entity for the transfers table plus the job state machine that
//! governs its status column.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Transfer entity representing one cross-provider copy job
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    /// Unique identifier for the transfer (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user identifier
    pub user_id: String,

    /// Owning application bundle
    pub app_bundle: String,

    /// Provider the items are copied from
    pub from_source: String,

    /// Provider the items are copied to
    pub to_source: String,

    /// Current job status (queued|started|finished|failed)
    pub status: String,

    /// Captured error text, set only when the job failed
    pub error: Option<String>,

    /// Serialized provider-native description of what was created,
    /// set only when the job finished
    pub result: Option<String>,

    /// Timestamp when the transfer was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the transfer was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Job states for a transfer.
///
/// `queued` is initial, `started` is the only state work may run in,
/// `finished` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Queued,
    Started,
    Finished,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Queued => "queued",
            TransferStatus::Started => "started",
            TransferStatus::Finished => "finished",
            TransferStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(TransferStatus::Queued),
            "started" => Some(TransferStatus::Started),
            "finished" => Some(TransferStatus::Finished),
            "failed" => Some(TransferStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Finished | TransferStatus::Failed)
    }

    /// Whether the state machine admits `self -> next`.
    ///
    /// Terminal states admit nothing, and a job cannot reach a terminal
    /// state without passing through `started`.
    pub fn can_transition(&self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (TransferStatus::Queued, TransferStatus::Started)
                | (TransferStatus::Started, TransferStatus::Finished)
                | (TransferStatus::Started, TransferStatus::Failed)
        )
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
