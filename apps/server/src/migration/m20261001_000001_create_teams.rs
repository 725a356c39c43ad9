//! Migration: Create teams table.
//!
//! `updated_at` is written by the application rather than a trigger, so
//! records copied in from the JSON files keep their timestamps.

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
                CREATE TABLE teams (
                    id VARCHAR(64) PRIMARY KEY,
                    name VARCHAR(200) NOT NULL,
                    description TEXT NOT NULL DEFAULT '',

                    -- Analyst ids as a JSON array of strings
                    member_ids JSONB NOT NULL DEFAULT '[]',

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS teams CASCADE;")
            .await?;

        Ok(())
    }
}
