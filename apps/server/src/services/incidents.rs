//! Incident facade: lifecycle, days-open derivation and statistics.

use tracing::info;

use super::analysts::without;
use super::{Stores, not_found};
use crate::error::AppResult;
use crate::models::{
    Incident, IncidentState, IncidentStats, IncidentUpdate, NewIncident, TestCaseUpdate, timestamp,
};

#[derive(Clone)]
pub struct IncidentService {
    stores: Stores,
}

impl IncidentService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(&self, new: NewIncident) -> AppResult<Incident> {
        new.validate()?;
        let now = timestamp();
        let incident = self
            .stores
            .incidents
            .run("create", |s| s.create_incident(&new, now))
            .await?;

        info!(
            incident_id = %incident.id,
            state = %incident.state,
            priority = incident.priority.as_str(),
            "Incident created"
        );
        Ok(incident.with_derived(now))
    }

    pub async fn get(&self, id: &str) -> AppResult<Incident> {
        self.stores
            .incidents
            .run("get", |s| s.get_incident(id))
            .await?
            .map(|i| i.with_derived(timestamp()))
            .ok_or_else(|| not_found("Incident", id))
    }

    /// All incidents, or only those in `state`.
    pub async fn list(&self, state: Option<IncidentState>) -> AppResult<Vec<Incident>> {
        let incidents = match state {
            Some(state) => {
                self.stores
                    .incidents
                    .run("list_by_state", |s| s.list_incidents_by_state(state))
                    .await?
            }
            None => self.stores.incidents.run("list", |s| s.list_incidents()).await?,
        };
        let now = timestamp();
        Ok(incidents.into_iter().map(|i| i.with_derived(now)).collect())
    }

    pub async fn update(&self, id: &str, update: IncidentUpdate) -> AppResult<Incident> {
        update.validate()?;
        let incident = self
            .stores
            .incidents
            .run("update", |s| s.update_incident(id, &update))
            .await?
            .ok_or_else(|| not_found("Incident", id))?;

        if update.state.is_some() {
            info!(incident_id = %id, state = %incident.state, "Incident state updated");
        }
        Ok(incident.with_derived(timestamp()))
    }

    /// Unlinks the incident from every test case citing it as a defect,
    /// then deletes it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.get(id).await?;

        let cases = self
            .stores
            .test_cases
            .run("list", |s| s.list_test_cases())
            .await?;
        for case in cases.iter().filter(|c| c.defect_ids.iter().any(|d| d == id)) {
            let update = TestCaseUpdate {
                defect_ids: Some(without(&case.defect_ids, id)),
                ..Default::default()
            };
            self.stores
                .test_cases
                .run("update", |s| s.update_test_case(&case.id, &update))
                .await?;
        }

        if !self
            .stores
            .incidents
            .run("delete", |s| s.delete_incident(id))
            .await?
        {
            return Err(not_found("Incident", id));
        }
        info!(incident_id = %id, "Incident deleted");
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<IncidentStats> {
        let incidents = self.stores.incidents.run("list", |s| s.list_incidents()).await?;
        Ok(IncidentStats::from_incidents(&incidents, timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{IncidentState, NewIncident, NewTestCase, Priority, TestCaseStatus};
    use crate::services::Services;
    use tempfile::TempDir;

    fn incident(priority: Priority, client: &str) -> NewIncident {
        NewIncident {
            state: IncidentState::Open,
            priority,
            description: "Login fails".to_string(),
            client: client.to_string(),
            cell: "Auth".to_string(),
            reported_by: None,
            assigned_to: "Maria".to_string(),
            reported_at: None,
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_resolve_then_reopen() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let created = services
            .incidents
            .create(incident(Priority::High, "Acme"))
            .await
            .unwrap();
        assert!(created.id.starts_with("INC-"));

        let resolve = serde_json::from_str(r#"{"estado":"Resuelto","comentario":"Patched"}"#)
            .unwrap();
        let resolved = services.incidents.update(&created.id, resolve).await.unwrap();
        assert_eq!(resolved.state, IncidentState::Resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.history.len(), 2);
        assert_eq!(resolved.history[1].comment.as_deref(), Some("Patched"));

        let reopen = serde_json::from_str(r#"{"estado":"Abierto"}"#).unwrap();
        let reopened = services.incidents.update(&created.id, reopen).await.unwrap();
        assert_eq!(reopened.resolved_at, None);
        assert_eq!(reopened.history.len(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_by_state_and_stats_count() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let first = services
            .incidents
            .create(incident(Priority::High, "Acme"))
            .await
            .unwrap();
        services
            .incidents
            .create(incident(Priority::Low, "Acme"))
            .await
            .unwrap();
        services
            .incidents
            .create(incident(Priority::Low, ""))
            .await
            .unwrap();
        let resolve = serde_json::from_str(r#"{"estado":"Resuelto"}"#).unwrap();
        services.incidents.update(&first.id, resolve).await.unwrap();

        let open = services.incidents.list(Some(IncidentState::Open)).await.unwrap();
        assert_eq!(open.len(), 2);

        let stats = services.incidents.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.total_abiertas, 2);
        assert_eq!(stats.total_resueltas, 1);
        assert_eq!(stats.por_prioridad.baja, 2);
        assert_eq!(stats.por_cliente.get("Acme"), Some(&2));
        assert_eq!(stats.promedio_dias_solucion, Some(0.0));
    }

    #[tokio::test]
    async fn test_delete_unlinks_defects_from_test_cases() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let bug = services
            .incidents
            .create(incident(Priority::Medium, "Acme"))
            .await
            .unwrap();
        let case = services
            .test_cases
            .create(NewTestCase {
                project_id: None,
                test_plan_id: None,
                user_story_id: String::new(),
                code: "TC-1".to_string(),
                title: "Login".to_string(),
                steps: vec![],
                expected_result: String::new(),
                test_type: "Funcional".to_string(),
                status: TestCaseStatus::NotExecuted,
                cycle: 1,
                defect_ids: vec![bug.id.clone()],
                responsible: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(case.status, TestCaseStatus::Failed);

        services.incidents.delete(&bug.id).await.unwrap();

        let case = services.test_cases.get(&case.id).await.unwrap();
        assert!(case.defect_ids.is_empty());
        assert!(services.incidents.list(None).await.unwrap().is_empty());
    }
}
