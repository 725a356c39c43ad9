//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_teams;
mod m20261001_000002_create_cells;
mod m20261001_000003_create_analysts;
mod m20261001_000004_create_projects;
mod m20261001_000005_create_incidents;
mod m20261001_000006_create_test_plans;
mod m20261001_000007_create_test_cases;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_teams::Migration),
            Box::new(m20261001_000002_create_cells::Migration),
            Box::new(m20261001_000003_create_analysts::Migration),
            Box::new(m20261001_000004_create_projects::Migration),
            Box::new(m20261001_000005_create_incidents::Migration),
            Box::new(m20261001_000006_create_test_plans::Migration),
            Box::new(m20261001_000007_create_test_cases::Migration),
        ]
    }
}
