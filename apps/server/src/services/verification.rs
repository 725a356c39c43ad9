//! Consistency check between the file and database backends.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::EntityKind;
use crate::store::{
    AnalystStore, Backend, CellStore, IncidentStore, ProjectStore, TeamStore, TestCaseStore,
    TestPlanStore,
};

/// Fields left out of the comparison: `updatedAt` moves on every write and
/// the rest are computed on read.
const IGNORED_FIELDS: &[&str] = &[
    "updatedAt",
    "diasAbierto",
    "effectiveStatus",
    "totalCases",
    "qualityScore",
];

/// A record present in both backends with different contents.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordMismatch {
    pub id: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityReport {
    pub entity: EntityKind,
    pub file_count: usize,
    pub database_count: usize,
    pub only_in_file: Vec<String>,
    pub only_in_database: Vec<String>,
    pub mismatched: Vec<RecordMismatch>,
}

impl EntityReport {
    pub fn is_consistent(&self) -> bool {
        self.only_in_file.is_empty()
            && self.only_in_database.is_empty()
            && self.mismatched.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub entities: Vec<EntityReport>,
}

impl VerificationReport {
    pub fn is_consistent(&self) -> bool {
        self.entities.iter().all(EntityReport::is_consistent)
    }
}

fn to_values<T: Serialize>(records: Vec<T>) -> AppResult<Vec<Value>> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(AppError::from))
        .collect()
}

/// Every record of `kind` as JSON, in the shape the API serves.
pub(crate) async fn snapshot(store: &dyn Backend, kind: EntityKind) -> AppResult<Vec<Value>> {
    match kind {
        EntityKind::Teams => to_values(store.list_teams().await?),
        EntityKind::Cells => to_values(store.list_cells().await?),
        EntityKind::Analysts => to_values(store.list_analysts().await?),
        EntityKind::Projects => to_values(store.list_projects().await?),
        EntityKind::Incidents => to_values(store.list_incidents().await?),
        EntityKind::TestPlans => to_values(store.list_test_plans().await?),
        EntityKind::TestCases => to_values(store.list_test_cases().await?),
    }
}

fn by_id(records: Vec<Value>) -> BTreeMap<String, Value> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id")?.as_str()?.to_string();
            Some((id, record))
        })
        .collect()
}

fn differing_fields(left: &Value, right: &Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let left = left.as_object().unwrap_or(&empty);
    let right = right.as_object().unwrap_or(&empty);

    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    keys.into_iter()
        .filter(|key| !IGNORED_FIELDS.contains(&key.as_str()))
        .filter(|key| left.get(*key) != right.get(*key))
        .cloned()
        .collect()
}

/// Compare one entity type's records from both backends.
pub fn compare_records(
    entity: EntityKind,
    file_records: Vec<Value>,
    database_records: Vec<Value>,
) -> EntityReport {
    let file = by_id(file_records);
    let database = by_id(database_records);

    let only_in_file = file
        .keys()
        .filter(|id| !database.contains_key(*id))
        .cloned()
        .collect();
    let only_in_database = database
        .keys()
        .filter(|id| !file.contains_key(*id))
        .cloned()
        .collect();
    let mismatched = file
        .iter()
        .filter_map(|(id, record)| {
            let other = database.get(id)?;
            let fields = differing_fields(record, other);
            (!fields.is_empty()).then(|| RecordMismatch {
                id: id.clone(),
                fields,
            })
        })
        .collect();

    EntityReport {
        entity,
        file_count: file.len(),
        database_count: database.len(),
        only_in_file,
        only_in_database,
        mismatched,
    }
}

/// Compare every entity type across both backends.
pub async fn verify_backends(
    file: &dyn Backend,
    database: &dyn Backend,
) -> AppResult<VerificationReport> {
    let mut entities = Vec::with_capacity(EntityKind::ALL.len());

    for kind in EntityKind::ALL {
        let report = compare_records(
            kind,
            snapshot(file, kind).await?,
            snapshot(database, kind).await?,
        );
        if report.is_consistent() {
            info!(entity = %kind, records = report.file_count, "Backends agree");
        } else {
            warn!(
                entity = %kind,
                only_in_file = report.only_in_file.len(),
                only_in_database = report.only_in_database.len(),
                mismatched = report.mismatched.len(),
                "Backends disagree"
            );
        }
        entities.push(report);
    }

    Ok(VerificationReport { entities })
}
