//! Store trait implementations over the JSON collections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{FileStore, Record};
use crate::error::AppResult;
use crate::models::{
    Analyst, AnalystUpdate, Cell, CellUpdate, EntityKind, Incident, IncidentState, IncidentUpdate,
    NewIncident, Project, ProjectUpdate, Team, TeamUpdate, TestCase, TestCaseUpdate, TestPlan,
    TestPlanUpdate, timestamp,
};
use crate::services::incident_id::next_incident_id;
use crate::store::{
    AnalystStore, CellStore, IncidentStore, ProjectStore, TeamStore, TestCaseStore, TestPlanStore,
};

macro_rules! record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

record!(Team, EntityKind::Teams);
record!(Cell, EntityKind::Cells);
record!(Analyst, EntityKind::Analysts);
record!(Project, EntityKind::Projects);
record!(Incident, EntityKind::Incidents);
record!(TestPlan, EntityKind::TestPlans);
record!(TestCase, EntityKind::TestCases);

#[async_trait]
impl AnalystStore for FileStore {
    async fn create_analyst(&self, analyst: &Analyst) -> AppResult<Analyst> {
        self.insert(analyst).await
    }

    async fn get_analyst(&self, id: &str) -> AppResult<Option<Analyst>> {
        self.find(id).await
    }

    async fn list_analysts(&self) -> AppResult<Vec<Analyst>> {
        self.load().await
    }

    async fn list_analysts_by_cell(&self, cell_id: &str) -> AppResult<Vec<Analyst>> {
        self.filter(|a: &Analyst| a.cell_ids.iter().any(|c| c == cell_id))
            .await
    }

    async fn update_analyst(
        &self,
        id: &str,
        update: &AnalystUpdate,
    ) -> AppResult<Option<Analyst>> {
        self.modify(id, |analyst: &mut Analyst| {
            update.apply(analyst, timestamp());
            Ok(())
        })
        .await
    }

    async fn delete_analyst(&self, id: &str) -> AppResult<bool> {
        self.remove::<Analyst>(id).await
    }

    async fn put_analyst(&self, analyst: &Analyst) -> AppResult<()> {
        self.upsert(analyst).await
    }
}

#[async_trait]
impl TeamStore for FileStore {
    async fn create_team(&self, team: &Team) -> AppResult<Team> {
        self.insert(team).await
    }

    async fn get_team(&self, id: &str) -> AppResult<Option<Team>> {
        self.find(id).await
    }

    async fn list_teams(&self) -> AppResult<Vec<Team>> {
        self.load().await
    }

    async fn update_team(&self, id: &str, update: &TeamUpdate) -> AppResult<Option<Team>> {
        self.modify(id, |team: &mut Team| {
            update.apply(team, timestamp());
            Ok(())
        })
        .await
    }

    async fn delete_team(&self, id: &str) -> AppResult<bool> {
        self.remove::<Team>(id).await
    }

    async fn put_team(&self, team: &Team) -> AppResult<()> {
        self.upsert(team).await
    }
}

#[async_trait]
impl CellStore for FileStore {
    async fn create_cell(&self, cell: &Cell) -> AppResult<Cell> {
        self.insert(cell).await
    }

    async fn get_cell(&self, id: &str) -> AppResult<Option<Cell>> {
        self.find(id).await
    }

    async fn list_cells(&self) -> AppResult<Vec<Cell>> {
        self.load().await
    }

    async fn list_cells_by_team(&self, team_id: &str) -> AppResult<Vec<Cell>> {
        self.filter(|c: &Cell| c.team_id == team_id).await
    }

    async fn update_cell(&self, id: &str, update: &CellUpdate) -> AppResult<Option<Cell>> {
        self.modify(id, |cell: &mut Cell| {
            update.apply(cell, timestamp());
            Ok(())
        })
        .await
    }

    async fn delete_cell(&self, id: &str) -> AppResult<bool> {
        self.remove::<Cell>(id).await
    }

    async fn put_cell(&self, cell: &Cell) -> AppResult<()> {
        self.upsert(cell).await
    }
}

#[async_trait]
impl ProjectStore for FileStore {
    async fn create_project(&self, project: &Project) -> AppResult<Project> {
        self.insert(project).await
    }

    async fn get_project(&self, id: &str) -> AppResult<Option<Project>> {
        self.find(id).await
    }

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        self.load().await
    }

    async fn list_projects_by_analyst(&self, analyst_id: &str) -> AppResult<Vec<Project>> {
        self.filter(|p: &Project| p.analyst_ids.iter().any(|a| a == analyst_id))
            .await
    }

    async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> AppResult<Option<Project>> {
        self.modify(id, |project: &mut Project| update.apply(project, timestamp()))
            .await
    }

    // Assignments are embedded in the record, so they go with it.
    async fn delete_project(&self, id: &str) -> AppResult<bool> {
        self.remove::<Project>(id).await
    }

    async fn put_project(&self, project: &Project) -> AppResult<()> {
        self.upsert(project).await
    }
}

#[async_trait]
impl IncidentStore for FileStore {
    async fn create_incident(
        &self,
        new: &NewIncident,
        now: DateTime<Utc>,
    ) -> AppResult<Incident> {
        self.mutate(|incidents: &mut Vec<Incident>| {
            let id = next_incident_id(now.date_naive(), incidents.iter().map(|i| i.id.as_str()));
            let incident = new.to_incident(id, now);
            incidents.push(incident.clone());
            Ok((incident, true))
        })
        .await
    }

    async fn get_incident(&self, id: &str) -> AppResult<Option<Incident>> {
        self.find(id).await
    }

    async fn list_incidents(&self) -> AppResult<Vec<Incident>> {
        self.load().await
    }

    async fn list_incidents_by_state(&self, state: IncidentState) -> AppResult<Vec<Incident>> {
        self.filter(|i: &Incident| i.state == state).await
    }

    async fn update_incident(
        &self,
        id: &str,
        update: &IncidentUpdate,
    ) -> AppResult<Option<Incident>> {
        self.modify(id, |incident: &mut Incident| {
            update.apply(incident, timestamp());
            Ok(())
        })
        .await
    }

    async fn delete_incident(&self, id: &str) -> AppResult<bool> {
        self.remove::<Incident>(id).await
    }

    async fn put_incident(&self, incident: &Incident) -> AppResult<()> {
        self.upsert(incident).await
    }
}

#[async_trait]
impl TestCaseStore for FileStore {
    async fn create_test_case(&self, case: &TestCase) -> AppResult<TestCase> {
        self.insert(case).await
    }

    async fn get_test_case(&self, id: &str) -> AppResult<Option<TestCase>> {
        self.find(id).await
    }

    async fn list_test_cases(&self) -> AppResult<Vec<TestCase>> {
        self.load().await
    }

    async fn list_test_cases_by_project(&self, project_id: &str) -> AppResult<Vec<TestCase>> {
        self.filter(|c: &TestCase| c.project_id.as_deref() == Some(project_id))
            .await
    }

    async fn list_test_cases_by_plan(&self, test_plan_id: &str) -> AppResult<Vec<TestCase>> {
        self.filter(|c: &TestCase| c.test_plan_id.as_deref() == Some(test_plan_id))
            .await
    }

    async fn update_test_case(
        &self,
        id: &str,
        update: &TestCaseUpdate,
    ) -> AppResult<Option<TestCase>> {
        self.modify(id, |case: &mut TestCase| {
            update.apply(case, timestamp());
            Ok(())
        })
        .await
    }

    async fn delete_test_case(&self, id: &str) -> AppResult<bool> {
        self.remove::<TestCase>(id).await
    }

    async fn put_test_case(&self, case: &TestCase) -> AppResult<()> {
        self.upsert(case).await
    }
}

#[async_trait]
impl TestPlanStore for FileStore {
    async fn create_test_plan(&self, plan: &TestPlan) -> AppResult<TestPlan> {
        self.insert(plan).await
    }

    async fn get_test_plan(&self, id: &str) -> AppResult<Option<TestPlan>> {
        self.find(id).await
    }

    async fn list_test_plans(&self) -> AppResult<Vec<TestPlan>> {
        self.load().await
    }

    async fn list_test_plans_by_project(&self, project_id: &str) -> AppResult<Vec<TestPlan>> {
        self.filter(|p: &TestPlan| p.project_id == project_id).await
    }

    async fn update_test_plan(
        &self,
        id: &str,
        update: &TestPlanUpdate,
    ) -> AppResult<Option<TestPlan>> {
        self.modify(id, |plan: &mut TestPlan| update.apply(plan, timestamp()))
            .await
    }

    async fn delete_test_plan(&self, id: &str) -> AppResult<bool> {
        self.remove::<TestPlan>(id).await
    }

    async fn put_test_plan(&self, plan: &TestPlan) -> AppResult<()> {
        self.upsert(plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentState, Priority};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn new_incident(description: &str) -> NewIncident {
        NewIncident {
            state: IncidentState::Open,
            priority: Priority::High,
            description: description.to_string(),
            client: "Acme".to_string(),
            cell: "Payments".to_string(),
            reported_by: None,
            assigned_to: "Ana".to_string(),
            reported_at: None,
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_incident_ids_are_sequential_per_day() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let now = "2024-03-09T10:00:00Z".parse::<DateTime<Utc>>().unwrap();

        let first = store.create_incident(&new_incident("a"), now).await.unwrap();
        let second = store.create_incident(&new_incident("b"), now).await.unwrap();

        assert_eq!(first.id, "INC-20240309-001");
        assert_eq!(second.id, "INC-20240309-002");
    }

    #[tokio::test]
    async fn test_concurrent_incident_creation_yields_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));
        let now = Utc::now();

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_incident(&new_incident(&format!("incident {}", i)), now)
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn test_legacy_file_with_derived_fields_loads() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("incidents.json"),
            r#"[{
                "id": "INC-20240101-001",
                "estado": "Abierto",
                "prioridad": "Alta",
                "descripcion": "Login fails",
                "cliente": "Acme",
                "celula": "Auth",
                "asignadoA": "Ana",
                "fechaCreacion": "2024-01-01T00:00:00Z",
                "fechaReporte": "2024-01-01T00:00:00Z",
                "diasAbierto": 99,
                "historialEstados": [],
                "updatedAt": "2024-01-01T00:00:00Z"
            }]"#,
        )
        .unwrap();
        let store = FileStore::new(dir.path());

        let incident = store.get_incident("INC-20240101-001").await.unwrap().unwrap();

        assert_eq!(incident.days_open, 0);
        assert!(incident.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_filters_by_relationship() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let now = Utc::now();
        for (id, team_id) in [("c1", "t1"), ("c2", "t2"), ("c3", "t1")] {
            store
                .create_cell(&Cell {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    team_id: team_id.to_string(),
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        let ids: Vec<String> = store
            .list_cells_by_team("t1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids, vec!["c1", "c3"]);
    }
}
