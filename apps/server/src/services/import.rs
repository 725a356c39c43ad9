//! Copy every record from one backend into the other.
//!
//! Records keep their ids and timestamps. Entity types are copied in
//! dependency order, so a partial run never leaves dangling references in
//! the target.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::error::AppResult;
use crate::models::EntityKind;
use crate::store::{
    AnalystStore, Backend, CellStore, IncidentStore, ProjectStore, TeamStore, TestCaseStore,
    TestPlanStore,
};

/// Records copied per entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub copied: BTreeMap<EntityKind, usize>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.copied.values().sum()
    }
}

macro_rules! copy_all {
    ($from:expr, $to:expr, $list:ident, $put:ident) => {{
        let records = $from.$list().await?;
        for record in &records {
            $to.$put(record).await?;
        }
        records.len()
    }};
}

async fn copy_entity(kind: EntityKind, from: &dyn Backend, to: &dyn Backend) -> AppResult<usize> {
    Ok(match kind {
        EntityKind::Teams => copy_all!(from, to, list_teams, put_team),
        EntityKind::Cells => copy_all!(from, to, list_cells, put_cell),
        EntityKind::Analysts => copy_all!(from, to, list_analysts, put_analyst),
        EntityKind::Projects => copy_all!(from, to, list_projects, put_project),
        EntityKind::Incidents => copy_all!(from, to, list_incidents, put_incident),
        EntityKind::TestPlans => copy_all!(from, to, list_test_plans, put_test_plan),
        EntityKind::TestCases => copy_all!(from, to, list_test_cases, put_test_case),
    })
}

/// Upsert every record of `from` into `to`. Running it twice is harmless.
pub async fn import_all(from: &dyn Backend, to: &dyn Backend) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();
    for kind in EntityKind::ALL {
        let copied = copy_entity(kind, from, to).await?;
        info!(entity = %kind, copied, "Imported records");
        summary.copied.insert(kind, copied);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_store::FileStore;
    use crate::models::{AnalystRole, NewAnalyst, NewCell, NewIncident, NewTeam};
    use crate::services::Services;
    use crate::services::verification::verify_backends;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_import_copies_everything_and_is_idempotent() {
        let source_dir = TempDir::new().unwrap();
        let target_dir = TempDir::new().unwrap();
        let services = Services::file_only(source_dir.path()).unwrap();

        let team = services
            .teams
            .create(NewTeam {
                name: "Core".to_string(),
                description: String::new(),
                member_ids: vec![],
            })
            .await
            .unwrap();
        let cell = services
            .cells
            .create(NewCell {
                name: "Payments".to_string(),
                team_id: team.id,
            })
            .await
            .unwrap();
        services
            .analysts
            .create(NewAnalyst {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                role: AnalystRole::Leader,
                color: None,
                cell_ids: vec![cell.id],
                availability: None,
            })
            .await
            .unwrap();

        let source = FileStore::new(source_dir.path());
        let target = FileStore::new(target_dir.path());

        let summary = import_all(&source, &target).await.unwrap();
        assert_eq!(summary.copied[&EntityKind::Teams], 1);
        assert_eq!(summary.copied[&EntityKind::Analysts], 1);
        assert_eq!(summary.copied[&EntityKind::Incidents], 0);
        assert_eq!(summary.total(), 3);

        import_all(&source, &target).await.unwrap();
        assert!(verify_backends(&source, &target).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_imported_incident_ids_continue_the_sequence() {
        let source_dir = TempDir::new().unwrap();
        let target_dir = TempDir::new().unwrap();
        let source = FileStore::new(source_dir.path());
        let target = FileStore::new(target_dir.path());
        let now = crate::models::timestamp();
        let new = NewIncident {
            state: Default::default(),
            priority: Default::default(),
            description: "Timeout".to_string(),
            client: String::new(),
            cell: String::new(),
            reported_by: None,
            assigned_to: String::new(),
            reported_at: None,
            attachments: vec![],
        };
        let first = source.create_incident(&new, now).await.unwrap();

        import_all(&source, &target).await.unwrap();
        let second = target.create_incident(&new, now).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
    }
}
