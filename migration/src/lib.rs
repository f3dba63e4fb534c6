//! Database migrations for the trackshift API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_04_02_100000_create_transfers;
mod m2025_04_02_100100_create_source_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_04_02_100000_create_transfers::Migration),
            Box::new(m2025_04_02_100100_create_source_tokens::Migration),
        ]
    }
}
