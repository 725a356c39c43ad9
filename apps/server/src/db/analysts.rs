//! Analyst queries. Cell membership lives in `analyst_cells` join rows.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{DbPool, db_error, parse_code};
use crate::entity::analyst::{self, Entity as AnalystEntity};
use crate::entity::analyst_cell::{self, Entity as AnalystCell};
use crate::error::{AppError, AppResult};
use crate::models::{Analyst, AnalystRole, AnalystUpdate, timestamp};
use crate::store::AnalystStore;

fn to_active(a: &Analyst) -> analyst::ActiveModel {
    analyst::ActiveModel {
        id: Set(a.id.clone()),
        name: Set(a.name.clone()),
        email: Set(a.email.clone()),
        role: Set(a.role.as_str().to_string()),
        color: Set(a.color.clone()),
        availability: Set(a.availability.map(i16::from)),
        created_at: Set(a.created_at),
        updated_at: Set(a.updated_at),
    }
}

fn cell_rows(a: &Analyst) -> Vec<analyst_cell::ActiveModel> {
    a.cell_ids
        .iter()
        .enumerate()
        .map(|(position, cell_id)| analyst_cell::ActiveModel {
            analyst_id: Set(a.id.clone()),
            cell_id: Set(cell_id.clone()),
            position: Set(position as i32),
        })
        .collect()
}

fn to_domain(model: analyst::Model, cell_ids: Vec<String>) -> AppResult<Analyst> {
    let availability = model
        .availability
        .map(u8::try_from)
        .transpose()
        .map_err(|_| AppError::Database(format!("Invalid availability for analyst {}", model.id)))?;

    Ok(Analyst {
        role: parse_code(&model.role, "analyst role", AnalystRole::parse)?,
        id: model.id,
        name: model.name,
        email: model.email,
        color: model.color,
        cell_ids,
        availability,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Insert the analyst row and its join rows.
async fn insert_analyst<C: ConnectionTrait>(conn: &C, a: &Analyst) -> AppResult<()> {
    AnalystEntity::insert(to_active(a))
        .exec_without_returning(conn)
        .await
        .map_err(db_error("insert analyst"))?;
    insert_cell_rows(conn, a).await
}

async fn insert_cell_rows<C: ConnectionTrait>(conn: &C, a: &Analyst) -> AppResult<()> {
    let rows = cell_rows(a);
    if rows.is_empty() {
        return Ok(());
    }
    AnalystCell::insert_many(rows)
        .exec_without_returning(conn)
        .await
        .map_err(db_error("insert analyst cells"))?;
    Ok(())
}

impl DbPool {
    /// Attach cell ids to analyst rows, keeping the row order.
    async fn hydrate_analysts(&self, models: Vec<analyst::Model>) -> AppResult<Vec<Analyst>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();

        let rows = AnalystCell::find()
            .filter(analyst_cell::Column::AnalystId.is_in(ids))
            .order_by_asc(analyst_cell::Column::Position)
            .all(self.connection())
            .await
            .map_err(db_error("load analyst cells"))?;

        let mut cells: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            cells.entry(row.analyst_id).or_default().push(row.cell_id);
        }

        models
            .into_iter()
            .map(|m| {
                let cell_ids = cells.remove(&m.id).unwrap_or_default();
                to_domain(m, cell_ids)
            })
            .collect()
    }
}

#[async_trait]
impl AnalystStore for DbPool {
    async fn create_analyst(&self, analyst: &Analyst) -> AppResult<Analyst> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        insert_analyst(&txn, analyst).await?;
        txn.commit().await.map_err(db_error("commit analyst"))?;
        Ok(analyst.clone())
    }

    async fn get_analyst(&self, id: &str) -> AppResult<Option<Analyst>> {
        let model = AnalystEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get analyst"))?;

        match model {
            Some(model) => Ok(self.hydrate_analysts(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_analysts(&self) -> AppResult<Vec<Analyst>> {
        let models = AnalystEntity::find()
            .order_by_asc(analyst::Column::CreatedAt)
            .order_by_asc(analyst::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list analysts"))?;

        self.hydrate_analysts(models).await
    }

    async fn list_analysts_by_cell(&self, cell_id: &str) -> AppResult<Vec<Analyst>> {
        let analyst_ids: Vec<String> = AnalystCell::find()
            .filter(analyst_cell::Column::CellId.eq(cell_id))
            .all(self.connection())
            .await
            .map_err(db_error("list analysts by cell"))?
            .into_iter()
            .map(|row| row.analyst_id)
            .collect();

        if analyst_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = AnalystEntity::find()
            .filter(analyst::Column::Id.is_in(analyst_ids))
            .order_by_asc(analyst::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list analysts by cell"))?;

        self.hydrate_analysts(models).await
    }

    async fn update_analyst(
        &self,
        id: &str,
        update: &AnalystUpdate,
    ) -> AppResult<Option<Analyst>> {
        let Some(mut analyst) = self.get_analyst(id).await? else {
            return Ok(None);
        };
        update.apply(&mut analyst, timestamp());

        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        AnalystEntity::update_many()
            .set(to_active(&analyst))
            .filter(analyst::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("update analyst"))?;
        if update.cell_ids.is_some() {
            AnalystCell::delete_many()
                .filter(analyst_cell::Column::AnalystId.eq(id))
                .exec(&txn)
                .await
                .map_err(db_error("replace analyst cells"))?;
            insert_cell_rows(&txn, &analyst).await?;
        }
        txn.commit().await.map_err(db_error("commit analyst"))?;

        Ok(Some(analyst))
    }

    // Join rows go with the analyst (ON DELETE CASCADE).
    async fn delete_analyst(&self, id: &str) -> AppResult<bool> {
        let result = AnalystEntity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await
            .map_err(db_error("delete analyst"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_analyst(&self, analyst: &Analyst) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        AnalystEntity::delete_by_id(analyst.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace analyst"))?;
        insert_analyst(&txn, analyst).await?;
        txn.commit().await.map_err(db_error("commit analyst"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{exec, pool, postgres};
    use chrono::{DateTime, Utc};

    fn row(id: &str, role: &str) -> analyst::Model {
        let at = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        analyst::Model {
            id: id.to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: role.to_string(),
            color: "#3b82f6".to_string(),
            availability: Some(75),
            created_at: at,
            updated_at: at,
        }
    }

    fn link(analyst_id: &str, cell_id: &str, position: i32) -> analyst_cell::Model {
        analyst_cell::Model {
            analyst_id: analyst_id.to_string(),
            cell_id: cell_id.to_string(),
            position,
        }
    }

    #[tokio::test]
    async fn test_get_analyst_attaches_cells_in_order() {
        let db = pool(
            postgres()
                .append_query_results([vec![row("a1", "senior")]])
                .append_query_results([vec![link("a1", "c2", 0), link("a1", "c1", 1)]]),
        );

        let analyst = db.get_analyst("a1").await.unwrap().unwrap();

        assert_eq!(analyst.role, AnalystRole::Senior);
        assert_eq!(analyst.cell_ids, vec!["c2", "c1"]);
        assert_eq!(analyst.availability, Some(75));
    }

    #[tokio::test]
    async fn test_get_missing_analyst() {
        let db = pool(postgres().append_query_results([Vec::<analyst::Model>::new()]));
        assert!(db.get_analyst("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_role_code_is_a_backend_error() {
        let db = pool(
            postgres()
                .append_query_results([vec![row("a1", "intern")]])
                .append_query_results([Vec::<analyst_cell::Model>::new()]),
        );

        let err = db.get_analyst("a1").await.unwrap_err();
        assert!(err.is_backend_failure());
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_row_was_removed() {
        let db = pool(postgres().append_exec_results([exec(1), exec(0)]));
        assert!(db.delete_analyst("a1").await.unwrap());
        assert!(!db.delete_analyst("a1").await.unwrap());
    }

    #[tokio::test]
    async fn test_query_failure_is_a_backend_error() {
        let db = pool(postgres().append_query_errors([sea_orm::DbErr::Custom(
            "connection reset".to_string(),
        )]));

        let err = db.list_analysts().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
