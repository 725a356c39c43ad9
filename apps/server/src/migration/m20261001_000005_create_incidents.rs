//! Migration: Create incidents table.
//!
//! The primary key doubles as the uniqueness guard for generated
//! `INC-YYYYMMDD-NNN` ids.

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
                CREATE TABLE incidents (
                    id VARCHAR(32) PRIMARY KEY,
                    state VARCHAR(20) NOT NULL
                        CHECK (state IN ('open', 'in_progress', 'resolved')),
                    priority VARCHAR(20) NOT NULL
                        CHECK (priority IN ('high', 'medium', 'low')),
                    description TEXT NOT NULL,
                    client VARCHAR(200) NOT NULL DEFAULT '',
                    cell VARCHAR(200) NOT NULL DEFAULT '',
                    reported_by VARCHAR(64),
                    assigned_to VARCHAR(200) NOT NULL DEFAULT '',
                    reported_at TIMESTAMPTZ NOT NULL,
                    resolved_at TIMESTAMPTZ,

                    -- Append-only state history: [{estado, fecha, comentario}]
                    history JSONB NOT NULL DEFAULT '[]',
                    attachments JSONB NOT NULL DEFAULT '[]',

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_incidents_state ON incidents(state);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS incidents CASCADE;")
            .await?;

        Ok(())
    }
}
