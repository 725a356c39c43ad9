//! Domain models shared by the file and database backends.
//!
//! Records serialize with the keys and enum values used by the legacy JSON
//! data files, so the file backend can read existing data unchanged.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod analyst;
pub mod incident;
pub mod project;
pub mod team;
pub mod test_case;
pub mod test_plan;

// Re-export commonly used types
pub use analyst::{Analyst, AnalystRole, AnalystUpdate, NewAnalyst};
pub use incident::{
    Incident, IncidentState, IncidentStats, IncidentUpdate, NewIncident, Priority,
    PriorityCounts, StateChange,
};
pub use project::{AnalystWorkload, NewProject, Project, ProjectStatus, ProjectUpdate};
pub use team::{Cell, CellUpdate, NewCell, NewTeam, Team, TeamUpdate};
pub use test_case::{Evidence, NewEvidence, NewTestCase, TestCase, TestCaseStatus, TestCaseUpdate};
pub use test_plan::{Cycle, NewTestPlan, TestPlan, TestPlanUpdate};

/// Entity types persisted through the dual storage backend.
///
/// `ALL` is in dependency order: referenced types come before the types that
/// reference them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Teams,
    Cells,
    Analysts,
    Projects,
    Incidents,
    TestPlans,
    TestCases,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        Self::Teams,
        Self::Cells,
        Self::Analysts,
        Self::Projects,
        Self::Incidents,
        Self::TestPlans,
        Self::TestCases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::Cells => "cells",
            Self::Analysts => "analysts",
            Self::Projects => "projects",
            Self::Incidents => "incidents",
            Self::TestPlans => "test_plans",
            Self::TestCases => "test_cases",
        }
    }

    /// Suffix of the `QAM_USE_POSTGRES_<ENTITY>` override variable.
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Self::Teams => "TEAMS",
            Self::Cells => "CELLS",
            Self::Analysts => "ANALYSTS",
            Self::Projects => "PROJECTS",
            Self::Incidents => "INCIDENTS",
            Self::TestPlans => "TEST_PLANS",
            Self::TestCases => "TEST_CASES",
        }
    }

    /// Name of the JSON collection file in the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Teams => "teams.json",
            Self::Cells => "cells.json",
            Self::Analysts => "analysts.json",
            Self::Projects => "projects.json",
            Self::Incidents => "incidents.json",
            Self::TestPlans => "test_plans.json",
            Self::TestCases => "test_cases.json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current time at the precision PostgreSQL stores (microseconds), so a
/// record reads back identically from either backend.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Generate a new record id (UUIDv7, time-ordered).
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Deserialize a present field as `Some(value)`, so that patch payloads can
/// tell "field absent" (`None`) from "field set to null" (`Some(None)`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trip_names() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
            assert!(kind.file_name().starts_with(kind.as_str()));
        }
        assert_eq!(EntityKind::parse("bugs"), None);
    }

    #[test]
    fn test_timestamp_has_microsecond_precision() {
        assert_eq!(timestamp().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
