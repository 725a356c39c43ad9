//! Team and cell queries.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};

use super::{DbPool, db_error, from_json, to_json};
use crate::entity::cell::{self, Entity as CellEntity};
use crate::entity::team::{self, Entity as TeamEntity};
use crate::error::AppResult;
use crate::models::{Cell, CellUpdate, Team, TeamUpdate, timestamp};
use crate::store::{CellStore, TeamStore};

fn team_to_active(t: &Team) -> AppResult<team::ActiveModel> {
    Ok(team::ActiveModel {
        id: Set(t.id.clone()),
        name: Set(t.name.clone()),
        description: Set(t.description.clone()),
        member_ids: Set(to_json(&t.member_ids, "teams.member_ids")?),
        created_at: Set(t.created_at),
        updated_at: Set(t.updated_at),
    })
}

fn team_to_domain(model: team::Model) -> AppResult<Team> {
    Ok(Team {
        member_ids: from_json(model.member_ids, "teams.member_ids")?,
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn cell_to_active(c: &Cell) -> cell::ActiveModel {
    cell::ActiveModel {
        id: Set(c.id.clone()),
        name: Set(c.name.clone()),
        team_id: Set(c.team_id.clone()),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
    }
}

impl From<cell::Model> for Cell {
    fn from(model: cell::Model) -> Self {
        Cell {
            id: model.id,
            name: model.name,
            team_id: model.team_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl TeamStore for DbPool {
    async fn create_team(&self, team: &Team) -> AppResult<Team> {
        TeamEntity::insert(team_to_active(team)?)
            .exec_without_returning(self.connection())
            .await
            .map_err(db_error("insert team"))?;
        Ok(team.clone())
    }

    async fn get_team(&self, id: &str) -> AppResult<Option<Team>> {
        TeamEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get team"))?
            .map(team_to_domain)
            .transpose()
    }

    async fn list_teams(&self) -> AppResult<Vec<Team>> {
        TeamEntity::find()
            .order_by_asc(team::Column::CreatedAt)
            .order_by_asc(team::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list teams"))?
            .into_iter()
            .map(team_to_domain)
            .collect()
    }

    async fn update_team(&self, id: &str, update: &TeamUpdate) -> AppResult<Option<Team>> {
        let Some(mut team) = self.get_team(id).await? else {
            return Ok(None);
        };
        update.apply(&mut team, timestamp());

        TeamEntity::update_many()
            .set(team_to_active(&team)?)
            .filter(team::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(db_error("update team"))?;

        Ok(Some(team))
    }

    async fn delete_team(&self, id: &str) -> AppResult<bool> {
        let result = TeamEntity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await
            .map_err(db_error("delete team"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_team(&self, team: &Team) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        TeamEntity::delete_by_id(team.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace team"))?;
        TeamEntity::insert(team_to_active(team)?)
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert team"))?;
        txn.commit().await.map_err(db_error("commit team"))?;
        Ok(())
    }
}

#[async_trait]
impl CellStore for DbPool {
    async fn create_cell(&self, cell: &Cell) -> AppResult<Cell> {
        CellEntity::insert(cell_to_active(cell))
            .exec_without_returning(self.connection())
            .await
            .map_err(db_error("insert cell"))?;
        Ok(cell.clone())
    }

    async fn get_cell(&self, id: &str) -> AppResult<Option<Cell>> {
        let model = CellEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get cell"))?;
        Ok(model.map(Cell::from))
    }

    async fn list_cells(&self) -> AppResult<Vec<Cell>> {
        let models = CellEntity::find()
            .order_by_asc(cell::Column::CreatedAt)
            .order_by_asc(cell::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list cells"))?;
        Ok(models.into_iter().map(Cell::from).collect())
    }

    async fn list_cells_by_team(&self, team_id: &str) -> AppResult<Vec<Cell>> {
        let models = CellEntity::find()
            .filter(cell::Column::TeamId.eq(team_id))
            .order_by_asc(cell::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list cells by team"))?;
        Ok(models.into_iter().map(Cell::from).collect())
    }

    async fn update_cell(&self, id: &str, update: &CellUpdate) -> AppResult<Option<Cell>> {
        let Some(mut cell) = self.get_cell(id).await? else {
            return Ok(None);
        };
        update.apply(&mut cell, timestamp());

        CellEntity::update_many()
            .set(cell_to_active(&cell))
            .filter(cell::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(db_error("update cell"))?;

        Ok(Some(cell))
    }

    async fn delete_cell(&self, id: &str) -> AppResult<bool> {
        let result = CellEntity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await
            .map_err(db_error("delete cell"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_cell(&self, cell: &Cell) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        CellEntity::delete_by_id(cell.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace cell"))?;
        CellEntity::insert(cell_to_active(cell))
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert cell"))?;
        txn.commit().await.map_err(db_error("commit cell"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{exec, pool, postgres};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_team_members_decoded_from_jsonb() {
        let db = pool(postgres().append_query_results([vec![team::Model {
            id: "t1".to_string(),
            name: "Core".to_string(),
            description: String::new(),
            member_ids: json!(["a1", "a2"]),
            created_at: at(),
            updated_at: at(),
        }]]));

        let team = db.get_team("t1").await.unwrap().unwrap();
        assert_eq!(team.member_ids, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_malformed_member_list_is_a_backend_error() {
        let db = pool(postgres().append_query_results([vec![team::Model {
            id: "t1".to_string(),
            name: "Core".to_string(),
            description: String::new(),
            member_ids: json!({"not": "a list"}),
            created_at: at(),
            updated_at: at(),
        }]]));

        assert!(db.get_team("t1").await.unwrap_err().is_backend_failure());
    }

    #[tokio::test]
    async fn test_update_cell_keeps_unspecified_fields() {
        let db = pool(
            postgres()
                .append_query_results([vec![cell::Model {
                    id: "c1".to_string(),
                    name: "Payments".to_string(),
                    team_id: "t1".to_string(),
                    created_at: at(),
                    updated_at: at(),
                }]])
                .append_exec_results([exec(1)]),
        );

        let update = CellUpdate {
            name: Some("Cards".to_string()),
            team_id: None,
        };
        let cell = db.update_cell("c1", &update).await.unwrap().unwrap();

        assert_eq!(cell.name, "Cards");
        assert_eq!(cell.team_id, "t1");
        assert_eq!(cell.created_at, at());
    }
}
