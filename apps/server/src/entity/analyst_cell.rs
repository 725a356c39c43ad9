//! Analyst-to-cell association.
//!
//! `cell_id` carries no foreign key: cells may live in the file backend.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analyst_cells")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub analyst_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub cell_id: String,
    /// Keeps the analyst's cell order stable
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::analyst::Entity",
        from = "Column::AnalystId",
        to = "super::analyst::Column::Id",
        on_delete = "Cascade"
    )]
    Analyst,
}

impl Related<super::analyst::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analyst.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
