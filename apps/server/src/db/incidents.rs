//! Incident queries.
//!
//! Ids are allocated from the highest existing id of the day. Two writers can
//! pick the same id; the primary key rejects the second insert, which then
//! recomputes and retries. Giving up is a conflict, not an outage.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::warn;

use super::{DbPool, db_error, from_json, parse_code, to_json};
use crate::entity::incident::{self, Entity as IncidentEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Incident, IncidentState, IncidentUpdate, NewIncident, Priority, timestamp};
use crate::services::incident_id::{day_prefix, next_incident_id};
use crate::store::IncidentStore;

/// Attempts at allocating a free id before giving up.
const MAX_ID_ATTEMPTS: u32 = 5;

fn to_active(i: &Incident) -> AppResult<incident::ActiveModel> {
    Ok(incident::ActiveModel {
        id: Set(i.id.clone()),
        state: Set(i.state.as_str().to_string()),
        priority: Set(i.priority.as_str().to_string()),
        description: Set(i.description.clone()),
        client: Set(i.client.clone()),
        cell: Set(i.cell.clone()),
        reported_by: Set(i.reported_by.clone()),
        assigned_to: Set(i.assigned_to.clone()),
        reported_at: Set(i.reported_at),
        resolved_at: Set(i.resolved_at),
        history: Set(to_json(&i.history, "incidents.history")?),
        attachments: Set(to_json(&i.attachments, "incidents.attachments")?),
        created_at: Set(i.created_at),
        updated_at: Set(i.updated_at),
    })
}

fn to_domain(model: incident::Model) -> AppResult<Incident> {
    Ok(Incident {
        state: parse_code(&model.state, "incident state", IncidentState::parse)?,
        priority: parse_code(&model.priority, "incident priority", Priority::parse)?,
        history: from_json(model.history, "incidents.history")?,
        attachments: from_json(model.attachments, "incidents.attachments")?,
        id: model.id,
        description: model.description,
        client: model.client,
        cell: model.cell,
        reported_by: model.reported_by,
        assigned_to: model.assigned_to,
        created_at: model.created_at,
        reported_at: model.reported_at,
        resolved_at: model.resolved_at,
        days_open: 0,
        updated_at: model.updated_at,
    })
}

fn is_duplicate_key(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Result of one id allocation attempt.
enum Allocation<T> {
    Inserted(T),
    IdTaken,
}

/// Runs `attempt` until it inserts, at most [`MAX_ID_ATTEMPTS`] times.
async fn with_id_retries<T, F, Fut>(mut attempt: F) -> AppResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<Allocation<T>>>,
{
    for n in 1..=MAX_ID_ATTEMPTS {
        if let Allocation::Inserted(value) = attempt(n).await? {
            return Ok(value);
        }
    }

    Err(AppError::ConstraintViolation(format!(
        "Could not allocate an incident id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

impl DbPool {
    async fn incident_ids_for_day(&self, now: DateTime<Utc>) -> AppResult<Vec<String>> {
        IncidentEntity::find()
            .select_only()
            .column(incident::Column::Id)
            .filter(incident::Column::Id.starts_with(day_prefix(now.date_naive())))
            .into_tuple::<String>()
            .all(self.connection())
            .await
            .map_err(db_error("list incident ids"))
    }
}

#[async_trait]
impl IncidentStore for DbPool {
    async fn create_incident(
        &self,
        new: &NewIncident,
        now: DateTime<Utc>,
    ) -> AppResult<Incident> {
        with_id_retries(move |attempt| async move {
            let existing = self.incident_ids_for_day(now).await?;
            let id = next_incident_id(now.date_naive(), existing.iter().map(String::as_str));
            let incident = new.to_incident(id, now);

            match IncidentEntity::insert(to_active(&incident)?)
                .exec_without_returning(self.connection())
                .await
            {
                Ok(_) => Ok(Allocation::Inserted(incident)),
                Err(err) if is_duplicate_key(&err) => {
                    warn!(id = %incident.id, attempt, "Incident id taken, retrying");
                    Ok(Allocation::IdTaken)
                }
                Err(err) => Err(db_error("insert incident")(err)),
            }
        })
        .await
    }

    async fn get_incident(&self, id: &str) -> AppResult<Option<Incident>> {
        IncidentEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get incident"))?
            .map(to_domain)
            .transpose()
    }

    async fn list_incidents(&self) -> AppResult<Vec<Incident>> {
        IncidentEntity::find()
            .order_by_asc(incident::Column::CreatedAt)
            .order_by_asc(incident::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list incidents"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn list_incidents_by_state(&self, state: IncidentState) -> AppResult<Vec<Incident>> {
        IncidentEntity::find()
            .filter(incident::Column::State.eq(state.as_str()))
            .order_by_asc(incident::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list incidents by state"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update_incident(
        &self,
        id: &str,
        update: &IncidentUpdate,
    ) -> AppResult<Option<Incident>> {
        let Some(mut incident) = self.get_incident(id).await? else {
            return Ok(None);
        };
        update.apply(&mut incident, timestamp());

        IncidentEntity::update_many()
            .set(to_active(&incident)?)
            .filter(incident::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(db_error("update incident"))?;

        Ok(Some(incident))
    }

    async fn delete_incident(&self, id: &str) -> AppResult<bool> {
        let result = IncidentEntity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await
            .map_err(db_error("delete incident"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_incident(&self, incident: &Incident) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        IncidentEntity::delete_by_id(incident.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace incident"))?;
        IncidentEntity::insert(to_active(incident)?)
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert incident"))?;
        txn.commit().await.map_err(db_error("commit incident"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{exec, pool, postgres};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn id_row(id: &str) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("id", sea_orm::Value::from(id.to_string()))])
    }

    fn new_incident() -> NewIncident {
        NewIncident {
            state: IncidentState::Open,
            priority: Priority::Low,
            description: "Slow search".to_string(),
            client: "Acme".to_string(),
            cell: "Search".to_string(),
            reported_by: None,
            assigned_to: String::new(),
            reported_at: None,
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_allocates_next_id_for_the_day() {
        let now = "2024-03-09T08:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let db = pool(
            postgres()
                .append_query_results([vec![id_row("INC-20240309-004")]])
                .append_exec_results([exec(1)]),
        );

        let incident = db.create_incident(&new_incident(), now).await.unwrap();

        assert_eq!(incident.id, "INC-20240309-005");
        assert_eq!(incident.history.len(), 1);
    }

    #[tokio::test]
    async fn test_create_gives_up_on_other_errors() {
        let now = Utc::now();
        let db = pool(
            postgres()
                .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
                .append_exec_errors([DbErr::Custom("disk full".to_string())]),
        );

        let err = db.create_incident(&new_incident(), now).await.unwrap_err();
        assert!(err.is_backend_failure());
    }

    #[tokio::test]
    async fn test_taken_id_is_recomputed_on_retry() {
        let day = "2024-03-09".parse::<chrono::NaiveDate>().unwrap();
        let mut taken = vec!["INC-20240309-004".to_string()];
        let mut attempts = Vec::new();

        let id = with_id_retries(|attempt| {
            attempts.push(attempt);
            let id = next_incident_id(day, taken.iter().map(String::as_str));
            let outcome = if attempt == 1 {
                // Another writer inserts the same id first.
                taken.push(id.clone());
                Allocation::IdTaken
            } else {
                Allocation::Inserted(id)
            };
            async move { Ok(outcome) }
        })
        .await
        .unwrap();

        assert_eq!(id, "INC-20240309-006");
        assert_eq!(attempts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_retries_stop_after_max_attempts() {
        let mut attempts = 0;

        let result: AppResult<String> = with_id_retries(|_| {
            attempts += 1;
            async { Ok(Allocation::IdTaken) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(attempts, MAX_ID_ATTEMPTS);
        assert!(matches!(err, AppError::ConstraintViolation(_)));
        assert!(!err.is_backend_failure());
    }

    #[tokio::test]
    async fn test_retry_loop_propagates_other_errors_immediately() {
        let mut attempts = 0;

        let result: AppResult<String> = with_id_retries(|_| {
            attempts += 1;
            async { Err(AppError::Database("connection reset".to_string())) }
        })
        .await;

        assert!(result.unwrap_err().is_backend_failure());
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_stored_codes_decode_to_domain_values() {
        let at = "2024-03-09T08:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let db = pool(postgres().append_query_results([vec![incident::Model {
            id: "INC-20240309-001".to_string(),
            state: "resolved".to_string(),
            priority: "high".to_string(),
            description: "Crash".to_string(),
            client: String::new(),
            cell: String::new(),
            reported_by: None,
            assigned_to: "Ana".to_string(),
            reported_at: at,
            resolved_at: Some(at),
            history: json!([{"estado": "Resuelto", "fecha": "2024-03-09T08:30:00Z"}]),
            attachments: json!([]),
            created_at: at,
            updated_at: at,
        }]]));

        let incident = db.get_incident("INC-20240309-001").await.unwrap().unwrap();

        assert_eq!(incident.state, IncidentState::Resolved);
        assert_eq!(incident.priority, Priority::High);
        assert_eq!(incident.history[0].state, IncidentState::Resolved);
    }
}
