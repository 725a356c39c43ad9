//! Test plan and cycle models.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::project::validate_range;
use super::{double_option, require_non_empty};
use crate::error::{AppError, AppResult};

/// One execution round of a test plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub designed: u32,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub not_executed: u32,
    #[serde(default)]
    pub defects: u32,
}

impl Cycle {
    pub fn empty(number: u32) -> Self {
        Cycle {
            number,
            start_date: None,
            end_date: None,
            designed: 0,
            successful: 0,
            not_executed: 0,
            defects: 0,
        }
    }
}

/// A grouping of test cases for a project, organized into cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    /// Derived on read: number of linked test cases.
    #[serde(default, skip_deserializing)]
    pub total_cases: u64,
    /// Derived on read: quality percentage, or -1 when the plan has no cases.
    #[serde(default, skip_deserializing)]
    pub quality_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a test plan.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTestPlan {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Defaults to a single empty cycle 1.
    #[serde(default)]
    pub cycles: Vec<Cycle>,
}

impl NewTestPlan {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("projectId", &self.project_id)?;
        require_non_empty("name", &self.name)?;
        validate_range(self.start_date, self.end_date)?;
        validate_cycles(&self.cycles)
    }

    pub fn into_test_plan(self, id: String, now: DateTime<Utc>) -> TestPlan {
        let mut cycles = if self.cycles.is_empty() {
            vec![Cycle::empty(1)]
        } else {
            self.cycles
        };
        cycles.sort_by_key(|c| c.number);

        TestPlan {
            id,
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            cycles,
            total_cases: 0,
            quality_score: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a test plan.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestPlanUpdate {
    pub project_id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<NaiveDate>>,
    pub cycles: Option<Vec<Cycle>>,
}

impl TestPlanUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref project_id) = self.project_id {
            require_non_empty("projectId", project_id)?;
        }
        if let Some(ref name) = self.name {
            require_non_empty("name", name)?;
        }
        if let Some(ref cycles) = self.cycles {
            validate_cycles(cycles)?;
        }
        Ok(())
    }

    pub fn apply(&self, plan: &mut TestPlan, now: DateTime<Utc>) -> AppResult<()> {
        let start_date = self.start_date.unwrap_or(plan.start_date);
        let end_date = self.end_date.unwrap_or(plan.end_date);
        validate_range(start_date, end_date)?;

        if let Some(ref project_id) = self.project_id {
            plan.project_id = project_id.clone();
        }
        if let Some(ref name) = self.name {
            plan.name = name.trim().to_string();
        }
        if let Some(ref cycles) = self.cycles {
            let mut cycles = cycles.clone();
            cycles.sort_by_key(|c| c.number);
            plan.cycles = cycles;
        }
        plan.start_date = start_date;
        plan.end_date = end_date;
        plan.updated_at = now;
        Ok(())
    }
}

fn validate_cycles(cycles: &[Cycle]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for cycle in cycles {
        if cycle.number == 0 {
            return Err(AppError::InvalidInput("cycle numbers start at 1".to_string()));
        }
        if !seen.insert(cycle.number) {
            return Err(AppError::InvalidInput(format!(
                "cycle {} is listed more than once",
                cycle.number
            )));
        }
        validate_range(cycle.start_date, cycle.end_date)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_plan(cycles: Vec<Cycle>) -> NewTestPlan {
        NewTestPlan {
            project_id: "p1".to_string(),
            name: "Release 1".to_string(),
            start_date: None,
            end_date: None,
            cycles,
        }
    }

    #[test]
    fn test_default_cycle() {
        let plan = new_plan(vec![]).into_test_plan("tp1".to_string(), Utc::now());
        assert_eq!(plan.cycles, vec![Cycle::empty(1)]);
    }

    #[test]
    fn test_duplicate_cycle_numbers_rejected() {
        let plan = new_plan(vec![Cycle::empty(1), Cycle::empty(1)]);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_cycles_sorted() {
        let plan = new_plan(vec![Cycle::empty(2), Cycle::empty(1)])
            .into_test_plan("tp1".to_string(), Utc::now());
        assert_eq!(plan.cycles[0].number, 1);
        assert_eq!(plan.cycles[1].number, 2);
    }
}
