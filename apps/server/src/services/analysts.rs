//! Analyst facade and workload report.

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;

use super::{Stores, not_found};
use crate::error::{AppError, AppResult};
use crate::models::{
    Analyst, AnalystUpdate, AnalystWorkload, NewAnalyst, ProjectStatus, ProjectUpdate, TeamUpdate,
    new_id, timestamp,
};

#[derive(Clone)]
pub struct AnalystService {
    stores: Stores,
}

impl AnalystService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn ensure_cells_exist(&self, cell_ids: &[String]) -> AppResult<()> {
        if cell_ids.is_empty() {
            return Ok(());
        }
        let cells = self.stores.cells.run("list", |s| s.list_cells()).await?;
        let known: HashSet<&str> = cells.iter().map(|c| c.id.as_str()).collect();

        match cell_ids.iter().find(|id| !known.contains(id.as_str())) {
            Some(missing) => Err(AppError::ConstraintViolation(format!(
                "Cell '{}' does not exist",
                missing
            ))),
            None => Ok(()),
        }
    }

    pub async fn create(&self, new: NewAnalyst) -> AppResult<Analyst> {
        new.validate()?;
        self.ensure_cells_exist(&new.cell_ids).await?;

        let analyst = new.into_analyst(new_id(), timestamp());
        let created = self
            .stores
            .analysts
            .run("create", |s| s.create_analyst(&analyst))
            .await?;

        info!(analyst_id = %created.id, "Analyst created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> AppResult<Analyst> {
        self.stores
            .analysts
            .run("get", |s| s.get_analyst(id))
            .await?
            .ok_or_else(|| not_found("Analyst", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Analyst>> {
        self.stores.analysts.run("list", |s| s.list_analysts()).await
    }

    pub async fn list_by_cell(&self, cell_id: &str) -> AppResult<Vec<Analyst>> {
        self.stores
            .analysts
            .run("list_by_cell", |s| s.list_analysts_by_cell(cell_id))
            .await
    }

    pub async fn update(&self, id: &str, update: AnalystUpdate) -> AppResult<Analyst> {
        update.validate()?;
        if let Some(ref cell_ids) = update.cell_ids {
            self.ensure_cells_exist(cell_ids).await?;
        }

        self.stores
            .analysts
            .run("update", |s| s.update_analyst(id, &update))
            .await?
            .ok_or_else(|| not_found("Analyst", id))
    }

    /// Removes the analyst from team memberships and project assignments,
    /// then deletes it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.get(id).await?;

        let teams = self.stores.teams.run("list", |s| s.list_teams()).await?;
        for team in teams.iter().filter(|t| t.member_ids.iter().any(|m| m == id)) {
            let update = TeamUpdate {
                member_ids: Some(without(&team.member_ids, id)),
                ..Default::default()
            };
            self.stores
                .teams
                .run("update", |s| s.update_team(&team.id, &update))
                .await?;
        }

        let projects = self
            .stores
            .projects
            .run("list_by_analyst", |s| s.list_projects_by_analyst(id))
            .await?;
        for project in &projects {
            let update = ProjectUpdate {
                analyst_ids: Some(without(&project.analyst_ids, id)),
                ..Default::default()
            };
            self.stores
                .projects
                .run("update", |s| s.update_project(&project.id, &update))
                .await?;
        }

        if !self
            .stores
            .analysts
            .run("delete", |s| s.delete_analyst(id))
            .await?
        {
            return Err(not_found("Analyst", id));
        }

        info!(analyst_id = %id, "Analyst deleted");
        Ok(())
    }

    /// Project load per analyst, using each project's effective status.
    pub async fn workload(&self) -> AppResult<Vec<AnalystWorkload>> {
        let analysts = self.list().await?;
        let projects = self
            .stores
            .projects
            .run("list", |s| s.list_projects())
            .await?;
        let today = Utc::now().date_naive();

        Ok(analysts
            .into_iter()
            .map(|analyst| {
                let mut workload = AnalystWorkload {
                    analyst_id: analyst.id.clone(),
                    name: analyst.name,
                    availability: analyst.availability,
                    assigned_projects: 0,
                    active_projects: 0,
                    active_estimated_hours: 0.0,
                };
                for project in projects
                    .iter()
                    .filter(|p| p.analyst_ids.contains(&analyst.id))
                {
                    workload.assigned_projects += 1;
                    if project.compute_status(today) == ProjectStatus::InProgress {
                        workload.active_projects += 1;
                        workload.active_estimated_hours += project.estimated_hours.unwrap_or(0.0);
                    }
                }
                workload
            })
            .collect())
    }
}

pub(crate) fn without(ids: &[String], id: &str) -> Vec<String> {
    ids.iter().filter(|i| *i != id).cloned().collect()
}
