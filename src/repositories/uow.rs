//! SQL unit of work.
//!
//! Lazily opens one transaction on first use and runs every repository
//! operation against it until `commit` or `rollback`. A dropped,
//! uncommitted unit rolls back with the underlying transaction.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{source_token, transfer};
use crate::providers::Source;
use crate::repositories::{
    NewSourceToken, NewTransfer, StoreError, TransferPatch, TransferUnitOfWork,
    source_token_repo, transfer_repo,
};

pub struct SqlUnitOfWork {
    db: DatabaseConnection,
    txn: Mutex<Option<DatabaseTransaction>>,
}

impl SqlUnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            txn: Mutex::new(None),
        }
    }

    /// Return the live transaction, opening one if none is active.
    async fn ensure_txn<'g>(
        &self,
        guard: &'g mut MutexGuard<'_, Option<DatabaseTransaction>>,
    ) -> Result<&'g DatabaseTransaction, StoreError> {
        if guard.is_none() {
            **guard = Some(self.db.begin().await?);
        }
        guard
            .as_ref()
            .ok_or_else(|| StoreError::Db(DbErr::Custom("transaction slot empty".to_string())))
    }
}

#[async_trait]
impl TransferUnitOfWork for SqlUnitOfWork {
    async fn get_transfer(&self, id: Uuid) -> Result<transfer::Model, StoreError> {
        let mut guard = self.txn.lock().await;
        let txn = self.ensure_txn(&mut guard).await?;
        transfer_repo::get_by_id(txn, id).await
    }

    async fn create_transfer(&self, new: NewTransfer) -> Result<transfer::Model, StoreError> {
        let mut guard = self.txn.lock().await;
        let txn = self.ensure_txn(&mut guard).await?;
        transfer_repo::create(txn, new).await
    }

    async fn update_transfer(
        &self,
        id: Uuid,
        patch: TransferPatch,
    ) -> Result<transfer::Model, StoreError> {
        let mut guard = self.txn.lock().await;
        let txn = self.ensure_txn(&mut guard).await?;
        transfer_repo::update(txn, id, patch).await
    }

    async fn get_source_token(
        &self,
        user_id: &str,
        app_bundle: &str,
        source: Source,
    ) -> Result<source_token::Model, StoreError> {
        let mut guard = self.txn.lock().await;
        let txn = self.ensure_txn(&mut guard).await?;
        source_token_repo::get_by_user(txn, user_id, app_bundle, source).await
    }

    async fn upsert_source_token(
        &self,
        new: NewSourceToken,
    ) -> Result<source_token::Model, StoreError> {
        let mut guard = self.txn.lock().await;
        let txn = self.ensure_txn(&mut guard).await?;
        source_token_repo::upsert(txn, new).await
    }

    async fn update_source_token(
        &self,
        user_id: &str,
        app_bundle: &str,
        source: Source,
        token_data: &str,
    ) -> Result<source_token::Model, StoreError> {
        let mut guard = self.txn.lock().await;
        let txn = self.ensure_txn(&mut guard).await?;
        source_token_repo::update_by_user(txn, user_id, app_bundle, source, token_data).await
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut guard = self.txn.lock().await;
        if let Some(txn) = guard.take() {
            txn.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut guard = self.txn.lock().await;
        if let Some(txn) = guard.take() {
            txn.rollback().await?;
        }
        Ok(())
    }
}
