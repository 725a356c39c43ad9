//! Test case entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: Option<String>,
    pub test_plan_id: Option<String>,
    pub user_story_id: String,
    pub code: String,
    pub title: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub steps: JsonValue,
    pub expected_result: String,
    pub test_type: String,
    /// not_executed, successful, failed, blocked, in_progress
    pub status: String,
    pub cycle: i32,
    /// Linked incident ids
    #[sea_orm(column_type = "JsonBinary")]
    pub defect_ids: JsonValue,
    #[sea_orm(column_type = "JsonBinary")]
    pub evidence: JsonValue,
    pub responsible: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
