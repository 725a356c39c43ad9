//! Migration: Create test_cases table.

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
                CREATE TABLE test_cases (
                    id VARCHAR(64) PRIMARY KEY,
                    project_id VARCHAR(64),
                    test_plan_id VARCHAR(64),
                    user_story_id VARCHAR(64) NOT NULL DEFAULT '',
                    code VARCHAR(64) NOT NULL DEFAULT '',
                    title TEXT NOT NULL,
                    steps JSONB NOT NULL DEFAULT '[]',
                    expected_result TEXT NOT NULL DEFAULT '',
                    test_type VARCHAR(100) NOT NULL DEFAULT '',
                    status VARCHAR(20) NOT NULL DEFAULT 'not_executed'
                        CHECK (status IN ('not_executed', 'successful', 'failed', 'blocked', 'in_progress')),
                    cycle INTEGER NOT NULL DEFAULT 1 CHECK (cycle >= 1),
                    defect_ids JSONB NOT NULL DEFAULT '[]',
                    evidence JSONB NOT NULL DEFAULT '[]',
                    responsible VARCHAR(200) NOT NULL DEFAULT '',

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_test_cases_project_id ON test_cases(project_id);
                CREATE INDEX idx_test_cases_test_plan_id ON test_cases(test_plan_id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS test_cases CASCADE;")
            .await?;

        Ok(())
    }
}
