//! # Persistence port
//!
//! The transactional unit of work the orchestration layer talks to, plus
//! the SQL implementation built on SeaORM. Orchestrators and handlers only
//! ever see [`TransferUnitOfWork`]; tests substitute in-memory doubles.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::transfer::TransferStatus;
use crate::models::{source_token, transfer};
use crate::providers::Source;

pub mod source_token_repo;
pub mod transfer_repo;
pub mod uow;

pub use uow::SqlUnitOfWork;

/// Errors surfaced by the persistence port.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: TransferStatus,
        to: TransferStatus,
    },
    #[error("stored value corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// Fields for a new transfer row; status always starts at `queued`.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub user_id: String,
    pub app_bundle: String,
    pub from_source: Source,
    pub to_source: Source,
}

/// Partial update applied to a transfer row. A status change is validated
/// against the state machine before it is written.
#[derive(Debug, Clone, Default)]
pub struct TransferPatch {
    pub status: Option<TransferStatus>,
    pub error: Option<String>,
    pub result: Option<String>,
}

impl TransferPatch {
    pub fn status(status: TransferStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Fields for a connect-source upsert.
#[derive(Debug, Clone)]
pub struct NewSourceToken {
    pub user_id: String,
    pub app_bundle: String,
    pub source: Source,
    pub token_data: String,
}

/// Transactional persistence port for transfers and source tokens.
///
/// Work accumulates in one lazily-opened transaction until `commit`;
/// dropping the unit without committing rolls the work back.
#[async_trait]
pub trait TransferUnitOfWork: Send + Sync {
    async fn get_transfer(&self, id: Uuid) -> Result<transfer::Model, StoreError>;

    async fn create_transfer(&self, new: NewTransfer) -> Result<transfer::Model, StoreError>;

    async fn update_transfer(
        &self,
        id: Uuid,
        patch: TransferPatch,
    ) -> Result<transfer::Model, StoreError>;

    async fn get_source_token(
        &self,
        user_id: &str,
        app_bundle: &str,
        source: Source,
    ) -> Result<source_token::Model, StoreError>;

    /// Create-or-replace keyed by (user, app, source); never a duplicate.
    async fn upsert_source_token(
        &self,
        new: NewSourceToken,
    ) -> Result<source_token::Model, StoreError>;

    /// Overwrite the blob of an existing row; absent row is an error.
    async fn update_source_token(
        &self,
        user_id: &str,
        app_bundle: &str,
        source: Source,
        token_data: &str,
    ) -> Result<source_token::Model, StoreError>;

    async fn commit(&self) -> Result<(), StoreError>;

    async fn rollback(&self) -> Result<(), StoreError>;
}

/// Detect a uniqueness violation across the supported backends so it can
/// surface as [`StoreError::Conflict`] instead of a generic 500.
pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    db_error.code().is_some_and(|code| {
        let code = code.as_ref();
        code == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code)
    })
}
