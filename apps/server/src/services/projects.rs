//! Project facade. Reads carry the effective status for today's date.

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;

use super::{Stores, not_found};
use crate::error::{AppError, AppResult};
use crate::models::{NewProject, Project, ProjectUpdate, new_id, timestamp};

#[derive(Clone)]
pub struct ProjectService {
    stores: Stores,
}

impl ProjectService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn ensure_analysts_exist(&self, analyst_ids: &[String]) -> AppResult<()> {
        if analyst_ids.is_empty() {
            return Ok(());
        }
        let analysts = self
            .stores
            .analysts
            .run("list", |s| s.list_analysts())
            .await?;
        let known: HashSet<&str> = analysts.iter().map(|a| a.id.as_str()).collect();

        match analyst_ids.iter().find(|id| !known.contains(id.as_str())) {
            Some(missing) => Err(AppError::ConstraintViolation(format!(
                "Analyst '{}' does not exist",
                missing
            ))),
            None => Ok(()),
        }
    }

    fn derive(project: Project) -> Project {
        project.with_derived(Utc::now().date_naive())
    }

    pub async fn create(&self, new: NewProject) -> AppResult<Project> {
        new.validate()?;
        self.ensure_analysts_exist(&new.analyst_ids).await?;

        let project = new.into_project(new_id(), timestamp());
        let created = self
            .stores
            .projects
            .run("create", |s| s.create_project(&project))
            .await?;

        info!(project_id = %created.id, "Project created");
        Ok(Self::derive(created))
    }

    pub async fn get(&self, id: &str) -> AppResult<Project> {
        self.stores
            .projects
            .run("get", |s| s.get_project(id))
            .await?
            .map(Self::derive)
            .ok_or_else(|| not_found("Project", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Project>> {
        let projects = self.stores.projects.run("list", |s| s.list_projects()).await?;
        Ok(projects.into_iter().map(Self::derive).collect())
    }

    pub async fn list_by_analyst(&self, analyst_id: &str) -> AppResult<Vec<Project>> {
        let projects = self
            .stores
            .projects
            .run("list_by_analyst", |s| s.list_projects_by_analyst(analyst_id))
            .await?;
        Ok(projects.into_iter().map(Self::derive).collect())
    }

    pub async fn update(&self, id: &str, update: ProjectUpdate) -> AppResult<Project> {
        update.validate()?;
        if let Some(ref analyst_ids) = update.analyst_ids {
            self.ensure_analysts_exist(analyst_ids).await?;
        }

        self.stores
            .projects
            .run("update", |s| s.update_project(id, &update))
            .await?
            .map(Self::derive)
            .ok_or_else(|| not_found("Project", id))
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self
            .stores
            .projects
            .run("delete", |s| s.delete_project(id))
            .await?
        {
            return Err(not_found("Project", id));
        }
        info!(project_id = %id, "Project deleted");
        Ok(())
    }
}
