//! Migration: Create analysts and analyst_cells tables.

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
                CREATE TABLE analysts (
                    id VARCHAR(64) PRIMARY KEY,
                    name VARCHAR(200) NOT NULL,
                    email VARCHAR(320) NOT NULL,
                    role VARCHAR(20) NOT NULL DEFAULT 'analyst'
                        CHECK (role IN ('analyst', 'senior', 'leader')),
                    color VARCHAR(32) NOT NULL,
                    availability SMALLINT
                        CHECK (availability IS NULL OR (availability >= 0 AND availability <= 100)),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Join rows; removed together with the analyst
                CREATE TABLE analyst_cells (
                    analyst_id VARCHAR(64) NOT NULL REFERENCES analysts(id) ON DELETE CASCADE,
                    cell_id VARCHAR(64) NOT NULL,
                    position INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (analyst_id, cell_id)
                );

                CREATE INDEX idx_analyst_cells_cell_id ON analyst_cells(cell_id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS analyst_cells CASCADE;
                DROP TABLE IF EXISTS analysts CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
