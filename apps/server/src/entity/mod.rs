//! SeaORM entity definitions for PostgreSQL database.

pub mod analyst;
pub mod analyst_cell;
pub mod cell;
pub mod incident;
pub mod project;
pub mod project_analyst;
pub mod team;
pub mod test_case;
pub mod test_plan;
