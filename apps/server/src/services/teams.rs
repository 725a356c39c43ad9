//! Team and cell facades.

use tracing::info;

use super::analysts::without;
use super::{Stores, not_found};
use crate::error::{AppError, AppResult};
use crate::models::{
    AnalystUpdate, Cell, CellUpdate, NewCell, NewTeam, Team, TeamUpdate, new_id, timestamp,
};

#[derive(Clone)]
pub struct TeamService {
    stores: Stores,
}

impl TeamService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(&self, new: NewTeam) -> AppResult<Team> {
        new.validate()?;
        let team = new.into_team(new_id(), timestamp());
        let created = self.stores.teams.run("create", |s| s.create_team(&team)).await?;
        info!(team_id = %created.id, "Team created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> AppResult<Team> {
        self.stores
            .teams
            .run("get", |s| s.get_team(id))
            .await?
            .ok_or_else(|| not_found("Team", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Team>> {
        self.stores.teams.run("list", |s| s.list_teams()).await
    }

    pub async fn update(&self, id: &str, update: TeamUpdate) -> AppResult<Team> {
        update.validate()?;
        self.stores
            .teams
            .run("update", |s| s.update_team(id, &update))
            .await?
            .ok_or_else(|| not_found("Team", id))
    }

    /// A team that still owns cells cannot be deleted.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let cells = self
            .stores
            .cells
            .run("list_by_team", |s| s.list_cells_by_team(id))
            .await?;
        if !cells.is_empty() {
            return Err(AppError::ConstraintViolation(format!(
                "Team '{}' still has {} cell(s)",
                id,
                cells.len()
            )));
        }

        if !self.stores.teams.run("delete", |s| s.delete_team(id)).await? {
            return Err(not_found("Team", id));
        }
        info!(team_id = %id, "Team deleted");
        Ok(())
    }
}

#[derive(Clone)]
pub struct CellService {
    stores: Stores,
}

impl CellService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn ensure_team_exists(&self, team_id: &str) -> AppResult<()> {
        let team = self
            .stores
            .teams
            .run("get", |s| s.get_team(team_id))
            .await?;
        if team.is_none() {
            return Err(AppError::ConstraintViolation(format!(
                "Team '{}' does not exist",
                team_id
            )));
        }
        Ok(())
    }

    pub async fn create(&self, new: NewCell) -> AppResult<Cell> {
        new.validate()?;
        self.ensure_team_exists(&new.team_id).await?;

        let cell = new.into_cell(new_id(), timestamp());
        let created = self.stores.cells.run("create", |s| s.create_cell(&cell)).await?;
        info!(cell_id = %created.id, team_id = %created.team_id, "Cell created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> AppResult<Cell> {
        self.stores
            .cells
            .run("get", |s| s.get_cell(id))
            .await?
            .ok_or_else(|| not_found("Cell", id))
    }

    pub async fn list(&self) -> AppResult<Vec<Cell>> {
        self.stores.cells.run("list", |s| s.list_cells()).await
    }

    pub async fn list_by_team(&self, team_id: &str) -> AppResult<Vec<Cell>> {
        self.stores
            .cells
            .run("list_by_team", |s| s.list_cells_by_team(team_id))
            .await
    }

    pub async fn update(&self, id: &str, update: CellUpdate) -> AppResult<Cell> {
        update.validate()?;
        if let Some(ref team_id) = update.team_id {
            self.ensure_team_exists(team_id).await?;
        }
        self.stores
            .cells
            .run("update", |s| s.update_cell(id, &update))
            .await?
            .ok_or_else(|| not_found("Cell", id))
    }

    /// Drops the cell from every analyst that belongs to it, then deletes it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.get(id).await?;

        let analysts = self
            .stores
            .analysts
            .run("list_by_cell", |s| s.list_analysts_by_cell(id))
            .await?;
        for analyst in &analysts {
            let update = AnalystUpdate {
                cell_ids: Some(without(&analyst.cell_ids, id)),
                ..Default::default()
            };
            self.stores
                .analysts
                .run("update", |s| s.update_analyst(&analyst.id, &update))
                .await?;
        }

        if !self.stores.cells.run("delete", |s| s.delete_cell(id)).await? {
            return Err(not_found("Cell", id));
        }
        info!(cell_id = %id, analysts = analysts.len(), "Cell deleted");
        Ok(())
    }
}
