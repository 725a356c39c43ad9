//! Migration: Create cells table.
//!
//! No foreign key to teams: the two entity types may be served by different
//! backends. The service layer checks the team exists.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE cells (
                    id VARCHAR(64) PRIMARY KEY,
                    name VARCHAR(200) NOT NULL,
                    team_id VARCHAR(64) NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_cells_team_id ON cells(team_id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS cells CASCADE;")
            .await?;

        Ok(())
    }
}
