//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20240819_000001_create_account;
mod m20240819_000002_create_transaction;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240819_000001_create_account::Migration),
            Box::new(m20240819_000002_create_transaction::Migration),
        ]
    }
}
