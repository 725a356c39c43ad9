//! Analyst entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analysts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub email: String,
    /// analyst, senior or leader
    pub role: String,
    pub color: String,
    /// Percentage 0-100
    pub availability: Option<i16>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::analyst_cell::Entity")]
    Cells,
}

impl Related<super::analyst_cell::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
