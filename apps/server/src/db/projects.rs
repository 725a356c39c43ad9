//! Project queries. Analyst assignments live in `project_analysts`.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{DbPool, db_error, parse_code};
use crate::entity::project::{self, Entity as ProjectEntity};
use crate::entity::project_analyst::{self, Entity as ProjectAnalyst};
use crate::error::AppResult;
use crate::models::{Project, ProjectStatus, ProjectUpdate, timestamp};
use crate::store::ProjectStore;

fn to_active(p: &Project) -> project::ActiveModel {
    project::ActiveModel {
        id: Set(p.id.clone()),
        jira_id: Set(p.jira_id.clone()),
        name: Set(p.name.clone()),
        team_id: Set(p.team_id.clone()),
        cell_id: Set(p.cell_id.clone()),
        estimated_hours: Set(p.estimated_hours),
        estimated_days: Set(p.estimated_days),
        start_date: Set(p.start_date),
        end_date: Set(p.end_date),
        status: Set(p.status.map(|s| s.as_str().to_string())),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

fn to_domain(model: project::Model, analyst_ids: Vec<String>) -> AppResult<Project> {
    let status = model
        .status
        .as_deref()
        .map(|s| parse_code(s, "project status", ProjectStatus::parse))
        .transpose()?;

    Ok(Project {
        id: model.id,
        jira_id: model.jira_id,
        name: model.name,
        team_id: model.team_id,
        cell_id: model.cell_id,
        estimated_hours: model.estimated_hours,
        estimated_days: model.estimated_days,
        start_date: model.start_date,
        end_date: model.end_date,
        status,
        effective_status: ProjectStatus::default(),
        analyst_ids,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

async fn insert_assignments<C: ConnectionTrait>(conn: &C, p: &Project) -> AppResult<()> {
    if p.analyst_ids.is_empty() {
        return Ok(());
    }
    let rows = p
        .analyst_ids
        .iter()
        .enumerate()
        .map(|(position, analyst_id)| project_analyst::ActiveModel {
            project_id: Set(p.id.clone()),
            analyst_id: Set(analyst_id.clone()),
            position: Set(position as i32),
        });
    ProjectAnalyst::insert_many(rows)
        .exec_without_returning(conn)
        .await
        .map_err(db_error("insert project analysts"))?;
    Ok(())
}

async fn delete_assignments<C: ConnectionTrait>(conn: &C, project_id: &str) -> AppResult<()> {
    ProjectAnalyst::delete_many()
        .filter(project_analyst::Column::ProjectId.eq(project_id))
        .exec(conn)
        .await
        .map_err(db_error("delete project analysts"))?;
    Ok(())
}

impl DbPool {
    async fn hydrate_projects(&self, models: Vec<project::Model>) -> AppResult<Vec<Project>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();

        let rows = ProjectAnalyst::find()
            .filter(project_analyst::Column::ProjectId.is_in(ids))
            .order_by_asc(project_analyst::Column::Position)
            .all(self.connection())
            .await
            .map_err(db_error("load project analysts"))?;

        let mut analysts: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            analysts.entry(row.project_id).or_default().push(row.analyst_id);
        }

        models
            .into_iter()
            .map(|m| {
                let analyst_ids = analysts.remove(&m.id).unwrap_or_default();
                to_domain(m, analyst_ids)
            })
            .collect()
    }
}

#[async_trait]
impl ProjectStore for DbPool {
    async fn create_project(&self, project: &Project) -> AppResult<Project> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        ProjectEntity::insert(to_active(project))
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert project"))?;
        insert_assignments(&txn, project).await?;
        txn.commit().await.map_err(db_error("commit project"))?;
        Ok(project.clone())
    }

    async fn get_project(&self, id: &str) -> AppResult<Option<Project>> {
        let model = ProjectEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get project"))?;

        match model {
            Some(model) => Ok(self.hydrate_projects(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let models = ProjectEntity::find()
            .order_by_asc(project::Column::CreatedAt)
            .order_by_asc(project::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list projects"))?;

        self.hydrate_projects(models).await
    }

    async fn list_projects_by_analyst(&self, analyst_id: &str) -> AppResult<Vec<Project>> {
        let project_ids: Vec<String> = ProjectAnalyst::find()
            .filter(project_analyst::Column::AnalystId.eq(analyst_id))
            .all(self.connection())
            .await
            .map_err(db_error("list projects by analyst"))?
            .into_iter()
            .map(|row| row.project_id)
            .collect();

        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = ProjectEntity::find()
            .filter(project::Column::Id.is_in(project_ids))
            .order_by_asc(project::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list projects by analyst"))?;

        self.hydrate_projects(models).await
    }

    async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> AppResult<Option<Project>> {
        let Some(mut project) = self.get_project(id).await? else {
            return Ok(None);
        };
        update.apply(&mut project, timestamp())?;

        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        ProjectEntity::update_many()
            .set(to_active(&project))
            .filter(project::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("update project"))?;
        if update.analyst_ids.is_some() {
            delete_assignments(&txn, id).await?;
            insert_assignments(&txn, &project).await?;
        }
        txn.commit().await.map_err(db_error("commit project"))?;

        Ok(Some(project))
    }

    async fn delete_project(&self, id: &str) -> AppResult<bool> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        delete_assignments(&txn, id).await?;
        let result = ProjectEntity::delete_by_id(id.to_string())
            .exec(&txn)
            .await
            .map_err(db_error("delete project"))?;
        txn.commit().await.map_err(db_error("commit project"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_project(&self, project: &Project) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        delete_assignments(&txn, &project.id).await?;
        ProjectEntity::delete_by_id(project.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace project"))?;
        ProjectEntity::insert(to_active(project))
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert project"))?;
        insert_assignments(&txn, project).await?;
        txn.commit().await.map_err(db_error("commit project"))?;
        Ok(())
    }
}
