//! Account table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ACCOUNT_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(r#"DROP TABLE IF EXISTS "account";"#)
            .await?;
        Ok(())
    }
}

const ACCOUNT_SQL: &str = r#"
CREATE TABLE "account" (
    "account_number" INTEGER NOT NULL,
    "balance" INTEGER NOT NULL,
    CONSTRAINT "pk_account" PRIMARY KEY ("account_number")
);
"#;
