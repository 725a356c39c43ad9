//! Project entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub jira_id: Option<String>,
    pub name: String,
    pub team_id: Option<String>,
    pub cell_id: Option<String>,
    pub estimated_hours: Option<f64>,
    pub estimated_days: Option<f64>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    /// Explicit status: to_start, in_progress, certified. NULL = derive from dates
    pub status: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_analyst::Entity")]
    Analysts,
}

impl Related<super::project_analyst::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analysts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
