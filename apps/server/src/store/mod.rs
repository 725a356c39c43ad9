//! Storage traits implemented by both backends.
//!
//! Each entity type has one trait. [`crate::file_store::FileStore`] and
//! [`crate::db::DbPool`] implement all of them; [`fallback::Backends`] picks
//! one per entity type at construction time.
//!
//! Store methods only touch their own entity's data. Checks and cleanup that
//! span entity types live in the service layer, so they keep working when
//! entity types are split across backends.
//!
//! Failure contract: a missing record is `Ok(None)` / `Ok(false)`; errors
//! are reserved for I/O, connection and data-corruption failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{
    Analyst, AnalystUpdate, Cell, CellUpdate, Incident, IncidentState, IncidentUpdate,
    NewIncident, Project, ProjectUpdate, Team, TeamUpdate, TestCase, TestCaseUpdate, TestPlan,
    TestPlanUpdate,
};

pub mod fallback;

pub use fallback::{BackendPolicy, Backends, StoreKind};

#[async_trait]
pub trait AnalystStore: Send + Sync {
    async fn create_analyst(&self, analyst: &Analyst) -> AppResult<Analyst>;
    async fn get_analyst(&self, id: &str) -> AppResult<Option<Analyst>>;
    async fn list_analysts(&self) -> AppResult<Vec<Analyst>>;
    async fn list_analysts_by_cell(&self, cell_id: &str) -> AppResult<Vec<Analyst>>;
    async fn update_analyst(&self, id: &str, update: &AnalystUpdate)
    -> AppResult<Option<Analyst>>;
    async fn delete_analyst(&self, id: &str) -> AppResult<bool>;
    /// Insert or replace a full record, keeping its id and timestamps.
    async fn put_analyst(&self, analyst: &Analyst) -> AppResult<()>;
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn create_team(&self, team: &Team) -> AppResult<Team>;
    async fn get_team(&self, id: &str) -> AppResult<Option<Team>>;
    async fn list_teams(&self) -> AppResult<Vec<Team>>;
    async fn update_team(&self, id: &str, update: &TeamUpdate) -> AppResult<Option<Team>>;
    async fn delete_team(&self, id: &str) -> AppResult<bool>;
    async fn put_team(&self, team: &Team) -> AppResult<()>;
}

#[async_trait]
pub trait CellStore: Send + Sync {
    async fn create_cell(&self, cell: &Cell) -> AppResult<Cell>;
    async fn get_cell(&self, id: &str) -> AppResult<Option<Cell>>;
    async fn list_cells(&self) -> AppResult<Vec<Cell>>;
    async fn list_cells_by_team(&self, team_id: &str) -> AppResult<Vec<Cell>>;
    async fn update_cell(&self, id: &str, update: &CellUpdate) -> AppResult<Option<Cell>>;
    async fn delete_cell(&self, id: &str) -> AppResult<bool>;
    async fn put_cell(&self, cell: &Cell) -> AppResult<()>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(&self, project: &Project) -> AppResult<Project>;
    async fn get_project(&self, id: &str) -> AppResult<Option<Project>>;
    async fn list_projects(&self) -> AppResult<Vec<Project>>;
    async fn list_projects_by_analyst(&self, analyst_id: &str) -> AppResult<Vec<Project>>;
    async fn update_project(&self, id: &str, update: &ProjectUpdate)
    -> AppResult<Option<Project>>;
    /// Removes the project's analyst assignments, then the project.
    async fn delete_project(&self, id: &str) -> AppResult<bool>;
    async fn put_project(&self, project: &Project) -> AppResult<()>;
}

#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Allocate the next `INC-YYYYMMDD-NNN` id for `now`'s date and store the incident.
    async fn create_incident(&self, new: &NewIncident, now: DateTime<Utc>)
    -> AppResult<Incident>;
    async fn get_incident(&self, id: &str) -> AppResult<Option<Incident>>;
    async fn list_incidents(&self) -> AppResult<Vec<Incident>>;
    async fn list_incidents_by_state(&self, state: IncidentState) -> AppResult<Vec<Incident>>;
    async fn update_incident(
        &self,
        id: &str,
        update: &IncidentUpdate,
    ) -> AppResult<Option<Incident>>;
    async fn delete_incident(&self, id: &str) -> AppResult<bool>;
    async fn put_incident(&self, incident: &Incident) -> AppResult<()>;
}

#[async_trait]
pub trait TestCaseStore: Send + Sync {
    async fn create_test_case(&self, case: &TestCase) -> AppResult<TestCase>;
    async fn get_test_case(&self, id: &str) -> AppResult<Option<TestCase>>;
    async fn list_test_cases(&self) -> AppResult<Vec<TestCase>>;
    async fn list_test_cases_by_project(&self, project_id: &str) -> AppResult<Vec<TestCase>>;
    async fn list_test_cases_by_plan(&self, test_plan_id: &str) -> AppResult<Vec<TestCase>>;
    async fn update_test_case(
        &self,
        id: &str,
        update: &TestCaseUpdate,
    ) -> AppResult<Option<TestCase>>;
    async fn delete_test_case(&self, id: &str) -> AppResult<bool>;
    async fn put_test_case(&self, case: &TestCase) -> AppResult<()>;
}

#[async_trait]
pub trait TestPlanStore: Send + Sync {
    async fn create_test_plan(&self, plan: &TestPlan) -> AppResult<TestPlan>;
    async fn get_test_plan(&self, id: &str) -> AppResult<Option<TestPlan>>;
    async fn list_test_plans(&self) -> AppResult<Vec<TestPlan>>;
    async fn list_test_plans_by_project(&self, project_id: &str) -> AppResult<Vec<TestPlan>>;
    async fn update_test_plan(
        &self,
        id: &str,
        update: &TestPlanUpdate,
    ) -> AppResult<Option<TestPlan>>;
    async fn delete_test_plan(&self, id: &str) -> AppResult<bool>;
    async fn put_test_plan(&self, plan: &TestPlan) -> AppResult<()>;
}

/// A backend holding every entity type. Verification and import work on two
/// of these directly, bypassing the per-entity policy.
pub trait Backend:
    TeamStore + CellStore + AnalystStore + ProjectStore + IncidentStore + TestPlanStore + TestCaseStore
{
}

impl<T> Backend for T where
    T: TeamStore
        + CellStore
        + AnalystStore
        + ProjectStore
        + IncidentStore
        + TestPlanStore
        + TestCaseStore
{
}
