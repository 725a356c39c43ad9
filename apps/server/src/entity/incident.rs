//! Incident entity for SeaORM.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    /// INC-YYYYMMDD-NNN
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// open, in_progress, resolved
    pub state: String,
    /// high, medium, low
    pub priority: String,
    pub description: String,
    pub client: String,
    pub cell: String,
    pub reported_by: Option<String>,
    pub assigned_to: String,
    pub reported_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "JsonBinary")]
    pub history: JsonValue,
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: JsonValue,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
