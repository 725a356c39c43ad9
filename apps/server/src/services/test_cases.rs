//! Test case facade and evidence recording.

use tracing::info;

use super::quality::QualityScope;
use super::{Stores, not_found};
use crate::error::{AppError, AppResult};
use crate::models::{NewEvidence, NewTestCase, TestCase, TestCaseUpdate, new_id, timestamp};

#[derive(Clone)]
pub struct TestCaseService {
    stores: Stores,
}

impl TestCaseService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn ensure_plan_exists(&self, test_plan_id: &str) -> AppResult<()> {
        let plan = self
            .stores
            .test_plans
            .run("get", |s| s.get_test_plan(test_plan_id))
            .await?;
        if plan.is_none() {
            return Err(AppError::ConstraintViolation(format!(
                "Test plan '{}' does not exist",
                test_plan_id
            )));
        }
        Ok(())
    }

    pub async fn create(&self, new: NewTestCase) -> AppResult<TestCase> {
        new.validate()?;
        if let Some(ref plan_id) = new.test_plan_id {
            self.ensure_plan_exists(plan_id).await?;
        }

        let case = new.into_test_case(new_id(), timestamp());
        let created = self
            .stores
            .test_cases
            .run("create", |s| s.create_test_case(&case))
            .await?;

        info!(test_case_id = %created.id, status = created.status.as_str(), "Test case created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> AppResult<TestCase> {
        self.stores
            .test_cases
            .run("get", |s| s.get_test_case(id))
            .await?
            .ok_or_else(|| not_found("Test case", id))
    }

    pub async fn list(&self) -> AppResult<Vec<TestCase>> {
        self.stores.test_cases.run("list", |s| s.list_test_cases()).await
    }

    pub async fn list_by_project(&self, project_id: &str) -> AppResult<Vec<TestCase>> {
        self.stores
            .test_cases
            .run("list_by_project", |s| s.list_test_cases_by_project(project_id))
            .await
    }

    pub async fn list_by_plan(&self, test_plan_id: &str) -> AppResult<Vec<TestCase>> {
        self.stores
            .test_cases
            .run("list_by_plan", |s| s.list_test_cases_by_plan(test_plan_id))
            .await
    }

    /// Cases matching every filter set in `scope`.
    pub async fn list_matching(&self, scope: &QualityScope) -> AppResult<Vec<TestCase>> {
        let cases = match (&scope.test_plan_id, &scope.project_id) {
            (Some(plan_id), _) => self.list_by_plan(plan_id).await?,
            (None, Some(project_id)) => self.list_by_project(project_id).await?,
            (None, None) => self.list().await?,
        };
        Ok(cases.into_iter().filter(|c| scope.matches(c)).collect())
    }

    pub async fn update(&self, id: &str, update: TestCaseUpdate) -> AppResult<TestCase> {
        update.validate()?;
        if let Some(Some(ref plan_id)) = update.test_plan_id {
            self.ensure_plan_exists(plan_id).await?;
        }

        self.stores
            .test_cases
            .run("update", |s| s.update_test_case(id, &update))
            .await?
            .ok_or_else(|| not_found("Test case", id))
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self
            .stores
            .test_cases
            .run("delete", |s| s.delete_test_case(id))
            .await?
        {
            return Err(not_found("Test case", id));
        }
        info!(test_case_id = %id, "Test case deleted");
        Ok(())
    }

    /// Append execution evidence; the case takes the evidence's result as
    /// its status.
    pub async fn add_evidence(&self, id: &str, new: NewEvidence) -> AppResult<TestCase> {
        new.validate()?;
        let case = self.get(id).await?;

        let evidence = new.into_evidence(timestamp());
        let status = evidence.result;
        let mut entries = case.evidence;
        entries.push(evidence);

        let update = TestCaseUpdate {
            evidence: Some(entries),
            status: Some(status),
            ..Default::default()
        };
        let updated = self.update(id, update).await?;

        info!(test_case_id = %id, result = status.as_str(), "Evidence recorded");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::models::{NewEvidence, NewTestCase, TestCaseStatus};
    use crate::services::{QualityScope, Services};
    use tempfile::TempDir;

    fn case(code: &str, project_id: Option<&str>, cycle: u32) -> NewTestCase {
        NewTestCase {
            project_id: project_id.map(String::from),
            test_plan_id: None,
            user_story_id: "HU-1".to_string(),
            code: code.to_string(),
            title: format!("Case {}", code),
            steps: vec!["Open page".to_string()],
            expected_result: "Page opens".to_string(),
            test_type: "Funcional".to_string(),
            status: TestCaseStatus::NotExecuted,
            cycle,
            defect_ids: vec![],
            responsible: "Ana".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_plan_rejected() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let mut new = case("TC-1", None, 1);
        new.test_plan_id = Some("ghost".to_string());

        let err = services.test_cases.create(new).await.unwrap_err();

        assert!(matches!(err, AppError::ConstraintViolation(_)));
        assert!(services.test_cases.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evidence_sets_status() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        let created = services.test_cases.create(case("TC-1", None, 1)).await.unwrap();

        let updated = services
            .test_cases
            .add_evidence(
                &created.id,
                NewEvidence {
                    date: None,
                    tester: "Ana".to_string(),
                    steps: vec!["Open page".to_string()],
                    screenshots: vec!["shot-1.png".to_string()],
                    result: TestCaseStatus::Successful,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, TestCaseStatus::Successful);
        assert_eq!(updated.evidence.len(), 1);
        assert_eq!(updated.title, created.title);
    }

    #[tokio::test]
    async fn test_list_matching_applies_every_filter() {
        let dir = TempDir::new().unwrap();
        let services = Services::file_only(dir.path()).unwrap();
        for (code, project, cycle) in [("A", "p1", 1), ("B", "p1", 2), ("C", "p2", 1)] {
            services
                .test_cases
                .create(case(code, Some(project), cycle))
                .await
                .unwrap();
        }

        let scope = QualityScope {
            project_id: Some("p1".to_string()),
            test_plan_id: None,
            cycle: Some(2),
        };
        let cases = services.test_cases.list_matching(&scope).await.unwrap();

        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].code, "B");
    }
}
