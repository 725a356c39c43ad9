//! Test plan facade.
//!
//! `totalCases` and `qualityScore` are never stored; they are computed from
//! the linked test cases every time a plan is read.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use super::quality::{self, QualityBreakdown};
use super::{Stores, not_found};
use crate::error::{AppError, AppResult};
use crate::models::{
    Cycle, NewTestPlan, TestCase, TestCaseStatus, TestCaseUpdate, TestPlan, TestPlanUpdate, new_id,
    timestamp,
};

/// Rebuild per-cycle counts from the plan's cases.
///
/// Cycles keep their dates; cycles that only appear on cases are added.
pub fn recompute_cycles(plan: &TestPlan, cases: &[TestCase]) -> Vec<Cycle> {
    let mut cycles: BTreeMap<u32, Cycle> = plan
        .cycles
        .iter()
        .map(|c| {
            let mut cycle = Cycle::empty(c.number);
            cycle.start_date = c.start_date;
            cycle.end_date = c.end_date;
            (c.number, cycle)
        })
        .collect();

    for case in cases {
        let cycle = cycles
            .entry(case.cycle)
            .or_insert_with(|| Cycle::empty(case.cycle));
        cycle.designed += 1;
        match case.status {
            TestCaseStatus::Successful => cycle.successful += 1,
            TestCaseStatus::NotExecuted => cycle.not_executed += 1,
            _ => {}
        }
        cycle.defects += case.defect_ids.len() as u32;
    }

    cycles.into_values().collect()
}

fn with_cases(mut plan: TestPlan, cases: &[TestCase]) -> TestPlan {
    plan.total_cases = cases.len() as u64;
    plan.quality_score = quality::score_test_cases(cases).score;
    plan
}

#[derive(Clone)]
pub struct TestPlanService {
    stores: Stores,
}

impl TestPlanService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn ensure_project_exists(&self, project_id: &str) -> AppResult<()> {
        let project = self
            .stores
            .projects
            .run("get", |s| s.get_project(project_id))
            .await?;
        if project.is_none() {
            return Err(AppError::ConstraintViolation(format!(
                "Project '{}' does not exist",
                project_id
            )));
        }
        Ok(())
    }

    async fn cases_of(&self, plan_id: &str) -> AppResult<Vec<TestCase>> {
        self.stores
            .test_cases
            .run("list_by_plan", |s| s.list_test_cases_by_plan(plan_id))
            .await
    }

    async fn derive(&self, plan: TestPlan) -> AppResult<TestPlan> {
        let cases = self.cases_of(&plan.id).await?;
        Ok(with_cases(plan, &cases))
    }

    async fn derive_all(&self, plans: Vec<TestPlan>) -> AppResult<Vec<TestPlan>> {
        let cases = self
            .stores
            .test_cases
            .run("list", |s| s.list_test_cases())
            .await?;
        let mut by_plan: HashMap<&str, Vec<TestCase>> = HashMap::new();
        for case in &cases {
            if let Some(ref plan_id) = case.test_plan_id {
                by_plan.entry(plan_id.as_str()).or_default().push(case.clone());
            }
        }

        Ok(plans
            .into_iter()
            .map(|plan| {
                let cases = by_plan.get(plan.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                with_cases(plan, cases)
            })
            .collect())
    }

    async fn fetch(&self, id: &str) -> AppResult<TestPlan> {
        self.stores
            .test_plans
            .run("get", |s| s.get_test_plan(id))
            .await?
            .ok_or_else(|| not_found("Test plan", id))
    }

    pub async fn create(&self, new: NewTestPlan) -> AppResult<TestPlan> {
        new.validate()?;
        self.ensure_project_exists(&new.project_id).await?;

        let plan = new.into_test_plan(new_id(), timestamp());
        let created = self
            .stores
            .test_plans
            .run("create", |s| s.create_test_plan(&plan))
            .await?;

        info!(test_plan_id = %created.id, project_id = %created.project_id, "Test plan created");
        Ok(with_cases(created, &[]))
    }

    pub async fn get(&self, id: &str) -> AppResult<TestPlan> {
        let plan = self.fetch(id).await?;
        self.derive(plan).await
    }

    pub async fn list(&self) -> AppResult<Vec<TestPlan>> {
        let plans = self.stores.test_plans.run("list", |s| s.list_test_plans()).await?;
        self.derive_all(plans).await
    }

    pub async fn list_by_project(&self, project_id: &str) -> AppResult<Vec<TestPlan>> {
        let plans = self
            .stores
            .test_plans
            .run("list_by_project", |s| s.list_test_plans_by_project(project_id))
            .await?;
        self.derive_all(plans).await
    }

    pub async fn update(&self, id: &str, update: TestPlanUpdate) -> AppResult<TestPlan> {
        update.validate()?;
        if let Some(ref project_id) = update.project_id {
            self.ensure_project_exists(project_id).await?;
        }

        let plan = self
            .stores
            .test_plans
            .run("update", |s| s.update_test_plan(id, &update))
            .await?
            .ok_or_else(|| not_found("Test plan", id))?;
        self.derive(plan).await
    }

    /// Unlinks the plan's cases (they are kept), then deletes the plan.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.fetch(id).await?;

        let cases = self.cases_of(id).await?;
        let unlink = TestCaseUpdate {
            test_plan_id: Some(None),
            ..Default::default()
        };
        for case in &cases {
            self.stores
                .test_cases
                .run("update", |s| s.update_test_case(&case.id, &unlink))
                .await?;
        }

        if !self
            .stores
            .test_plans
            .run("delete", |s| s.delete_test_plan(id))
            .await?
        {
            return Err(not_found("Test plan", id));
        }
        info!(test_plan_id = %id, unlinked_cases = cases.len(), "Test plan deleted");
        Ok(())
    }

    pub async fn quality(&self, id: &str) -> AppResult<QualityBreakdown> {
        self.fetch(id).await?;
        let cases = self.cases_of(id).await?;
        Ok(quality::score_test_cases(&cases))
    }

    /// Recompute cycle counts from the linked cases. With `persist`, the new
    /// cycles are written back.
    pub async fn recompute(&self, id: &str, persist: bool) -> AppResult<TestPlan> {
        let mut plan = self.fetch(id).await?;
        let cases = self.cases_of(id).await?;
        let cycles = recompute_cycles(&plan, &cases);

        if persist {
            let update = TestPlanUpdate {
                cycles: Some(cycles),
                ..Default::default()
            };
            plan = self
                .stores
                .test_plans
                .run("update", |s| s.update_test_plan(id, &update))
                .await?
                .ok_or_else(|| not_found("Test plan", id))?;
            info!(test_plan_id = %id, "Test plan cycles recomputed");
        } else {
            plan.cycles = cycles;
        }

        Ok(with_cases(plan, &cases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, NewTestCase};
    use crate::services::Services;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn new_case(plan_id: &str, cycle: u32, status: TestCaseStatus, defects: &[&str]) -> NewTestCase {
        NewTestCase {
            project_id: None,
            test_plan_id: Some(plan_id.to_string()),
            user_story_id: String::new(),
            code: String::new(),
            title: "Transfer".to_string(),
            steps: vec![],
            expected_result: String::new(),
            test_type: "Funcional".to_string(),
            status,
            cycle,
            defect_ids: defects.iter().map(|d| d.to_string()).collect(),
            responsible: String::new(),
        }
    }

    async fn setup() -> (TempDir, Services, TestPlan) {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let project = services
            .projects
            .create(NewProject {
                jira_id: None,
                name: "Transfers".to_string(),
                team_id: None,
                cell_id: None,
                estimated_hours: None,
                estimated_days: None,
                start_date: None,
                end_date: None,
                status: None,
                analyst_ids: vec![],
            })
            .await
            .unwrap();
        let mut cycle = Cycle::empty(1);
        cycle.start_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let plan = services
            .test_plans
            .create(NewTestPlan {
                project_id: project.id,
                name: "Release 1".to_string(),
                start_date: None,
                end_date: None,
                cycles: vec![cycle],
            })
            .await
            .unwrap();
        (dir, services, plan)
    }

    #[tokio::test]
    async fn test_new_plan_has_no_score() {
        let (_dir, _services, plan) = setup().await;
        assert_eq!(plan.total_cases, 0);
        assert_eq!(plan.quality_score, quality::NOT_APPLICABLE);
    }

    #[tokio::test]
    async fn test_plan_needs_existing_project() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let err = services
            .test_plans
            .create(NewTestPlan {
                project_id: "ghost".to_string(),
                name: "Release".to_string(),
                start_date: None,
                end_date: None,
                cycles: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_reads_derive_totals_from_cases() {
        let (_dir, services, plan) = setup().await;
        for status in [TestCaseStatus::Successful, TestCaseStatus::NotExecuted] {
            services
                .test_cases
                .create(new_case(&plan.id, 1, status, &[]))
                .await
                .unwrap();
        }

        let plan = services.test_plans.get(&plan.id).await.unwrap();
        let listed = services.test_plans.list().await.unwrap();

        assert_eq!(plan.total_cases, 2);
        // coverage 50, effectiveness 100, defects 100, diversity 20
        assert_eq!(plan.quality_score, 74.5);
        assert_eq!(listed[0].quality_score, plan.quality_score);
    }

    #[tokio::test]
    async fn test_recompute_persists_cycle_counts() {
        let (_dir, services, plan) = setup().await;
        services
            .test_cases
            .create(new_case(&plan.id, 1, TestCaseStatus::Successful, &[]))
            .await
            .unwrap();
        services
            .test_cases
            .create(new_case(&plan.id, 2, TestCaseStatus::NotExecuted, &["INC-1", "INC-2"]))
            .await
            .unwrap();

        let recomputed = services.test_plans.recompute(&plan.id, true).await.unwrap();

        assert_eq!(recomputed.cycles.len(), 2);
        let first = &recomputed.cycles[0];
        assert_eq!((first.designed, first.successful), (1, 1));
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        let second = &recomputed.cycles[1];
        // Escalated to failed because it carries defects.
        assert_eq!((second.designed, second.not_executed, second.defects), (1, 0, 2));

        let stored = services.test_plans.get(&plan.id).await.unwrap();
        assert_eq!(stored.cycles, recomputed.cycles);
    }

    #[tokio::test]
    async fn test_delete_unlinks_cases() {
        let (_dir, services, plan) = setup().await;
        let case = services
            .test_cases
            .create(new_case(&plan.id, 1, TestCaseStatus::Failed, &[]))
            .await
            .unwrap();

        services.test_plans.delete(&plan.id).await.unwrap();

        let case = services.test_cases.get(&case.id).await.unwrap();
        assert_eq!(case.test_plan_id, None);
        assert!(services.test_plans.list().await.unwrap().is_empty());
    }
}
