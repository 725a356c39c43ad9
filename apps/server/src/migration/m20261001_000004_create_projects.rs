//! Migration: Create projects and project_analysts tables.

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
                CREATE TABLE projects (
                    id VARCHAR(64) PRIMARY KEY,
                    jira_id VARCHAR(64),
                    name VARCHAR(300) NOT NULL,
                    team_id VARCHAR(64),
                    cell_id VARCHAR(64),
                    estimated_hours DOUBLE PRECISION
                        CHECK (estimated_hours IS NULL OR estimated_hours >= 0),
                    estimated_days DOUBLE PRECISION
                        CHECK (estimated_days IS NULL OR estimated_days >= 0),
                    start_date DATE,
                    end_date DATE,

                    -- NULL means the status is derived from the dates
                    status VARCHAR(20)
                        CHECK (status IS NULL OR status IN ('to_start', 'in_progress', 'certified')),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    CHECK (start_date IS NULL OR end_date IS NULL OR start_date <= end_date)
                );

                CREATE TABLE project_analysts (
                    project_id VARCHAR(64) NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                    analyst_id VARCHAR(64) NOT NULL,
                    position INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (project_id, analyst_id)
                );

                CREATE INDEX idx_project_analysts_analyst_id ON project_analysts(analyst_id);
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
                DROP TABLE IF EXISTS project_analysts CASCADE;
                DROP TABLE IF EXISTS projects CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
