//! Transaction record table.
//!
//! One row per leg. There is no foreign key to `account`, so locking an
//! account row never interacts with record inserts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(TRANSACTION_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(r#"DROP TABLE IF EXISTS "transaction";"#)
            .await?;
        Ok(())
    }
}

const TRANSACTION_SQL: &str = r#"
CREATE TABLE "transaction" (
    "id" SERIAL NOT NULL,
    "account" INTEGER NOT NULL,
    "type" CHARACTER VARYING NOT NULL,
    "value" INTEGER NOT NULL,
    "kind" CHARACTER VARYING NOT NULL,
    "from" INTEGER,
    "to" INTEGER,
    "created_at" TIMESTAMP NOT NULL DEFAULT now(),
    CONSTRAINT "pk_transaction" PRIMARY KEY ("id")
);

-- Per-account history, newest first
CREATE INDEX "idx_transaction_account_created" ON "transaction" ("account", "created_at" DESC);
"#;
