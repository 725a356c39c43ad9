//! Test case models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::analyst::dedup;
use super::{double_option, require_non_empty};
use crate::error::{AppError, AppResult};

/// Execution status of a test case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TestCaseStatus {
    #[default]
    #[serde(rename = "No Ejecutado")]
    NotExecuted,
    #[serde(rename = "Exitoso")]
    Successful,
    #[serde(rename = "Fallido")]
    Failed,
    #[serde(rename = "Bloqueado")]
    Blocked,
    #[serde(rename = "En Progreso")]
    InProgress,
}

impl TestCaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotExecuted => "not_executed",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
            Self::InProgress => "in_progress",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_executed" => Some(Self::NotExecuted),
            "successful" => Some(Self::Successful),
            "failed" => Some(Self::Failed),
            "blocked" => Some(Self::Blocked),
            "in_progress" => Some(Self::InProgress),
            _ => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        !matches!(self, Self::NotExecuted)
    }
}

/// Execution evidence recorded against a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub date: DateTime<Utc>,
    pub tester: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    pub result: TestCaseStatus,
}

/// Request to record evidence. The case status follows the result.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEvidence {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub tester: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    pub result: TestCaseStatus,
}

impl NewEvidence {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("tester", &self.tester)?;
        if !self.result.is_executed() {
            return Err(AppError::InvalidInput(
                "evidence result must be an executed status".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_evidence(self, now: DateTime<Utc>) -> Evidence {
        Evidence {
            date: self.date.unwrap_or(now),
            tester: self.tester,
            steps: self.steps,
            screenshots: self.screenshots,
            result: self.result,
        }
    }
}

/// A single verifiable test scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_plan_id: Option<String>,
    #[serde(default)]
    pub user_story_id: String,
    #[serde(default)]
    pub code: String,
    pub title: String,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub test_type: String,
    #[serde(default)]
    pub status: TestCaseStatus,
    #[serde(default = "default_cycle")]
    pub cycle: u32,
    /// Linked incident ids.
    #[serde(default)]
    pub defect_ids: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub responsible: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_cycle() -> u32 {
    1
}

impl TestCase {
    /// A case with defects that was never executed counts as failed.
    pub fn escalate_status(&mut self) {
        if !self.defect_ids.is_empty() && self.status == TestCaseStatus::NotExecuted {
            self.status = TestCaseStatus::Failed;
        }
    }
}

/// Request to create a test case.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTestCase {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub test_plan_id: Option<String>,
    #[serde(default)]
    pub user_story_id: String,
    #[serde(default)]
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub test_type: String,
    #[serde(default)]
    pub status: TestCaseStatus,
    #[serde(default = "default_cycle")]
    pub cycle: u32,
    #[serde(default)]
    pub defect_ids: Vec<String>,
    #[serde(default)]
    pub responsible: String,
}

impl NewTestCase {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("title", &self.title)?;
        validate_cycle(self.cycle)
    }

    pub fn into_test_case(self, id: String, now: DateTime<Utc>) -> TestCase {
        let mut case = TestCase {
            id,
            project_id: self.project_id,
            test_plan_id: self.test_plan_id,
            user_story_id: self.user_story_id,
            code: self.code,
            title: self.title.trim().to_string(),
            steps: self.steps,
            expected_result: self.expected_result,
            test_type: self.test_type.trim().to_string(),
            status: self.status,
            cycle: self.cycle,
            defect_ids: dedup(self.defect_ids),
            evidence: Vec::new(),
            responsible: self.responsible,
            created_at: now,
            updated_at: now,
        };
        case.escalate_status();
        case
    }
}

/// Partial update for a test case.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseUpdate {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub project_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub test_plan_id: Option<Option<String>>,
    pub user_story_id: Option<String>,
    pub code: Option<String>,
    pub title: Option<String>,
    pub steps: Option<Vec<String>>,
    pub expected_result: Option<String>,
    pub test_type: Option<String>,
    pub status: Option<TestCaseStatus>,
    pub cycle: Option<u32>,
    pub defect_ids: Option<Vec<String>>,
    pub evidence: Option<Vec<Evidence>>,
    pub responsible: Option<String>,
}

impl TestCaseUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref title) = self.title {
            require_non_empty("title", title)?;
        }
        if let Some(cycle) = self.cycle {
            validate_cycle(cycle)?;
        }
        Ok(())
    }

    pub fn apply(&self, case: &mut TestCase, now: DateTime<Utc>) {
        if let Some(ref project_id) = self.project_id {
            case.project_id = project_id.clone();
        }
        if let Some(ref test_plan_id) = self.test_plan_id {
            case.test_plan_id = test_plan_id.clone();
        }
        if let Some(ref user_story_id) = self.user_story_id {
            case.user_story_id = user_story_id.clone();
        }
        if let Some(ref code) = self.code {
            case.code = code.clone();
        }
        if let Some(ref title) = self.title {
            case.title = title.trim().to_string();
        }
        if let Some(ref steps) = self.steps {
            case.steps = steps.clone();
        }
        if let Some(ref expected_result) = self.expected_result {
            case.expected_result = expected_result.clone();
        }
        if let Some(ref test_type) = self.test_type {
            case.test_type = test_type.trim().to_string();
        }
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(cycle) = self.cycle {
            case.cycle = cycle;
        }
        if let Some(ref defect_ids) = self.defect_ids {
            case.defect_ids = dedup(defect_ids.clone());
        }
        if let Some(ref evidence) = self.evidence {
            case.evidence = evidence.clone();
        }
        if let Some(ref responsible) = self.responsible {
            case.responsible = responsible.clone();
        }
        case.escalate_status();
        case.updated_at = now;
    }
}

fn validate_cycle(cycle: u32) -> AppResult<()> {
    if cycle == 0 {
        return Err(AppError::InvalidInput("cycle numbers start at 1".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_case(defects: Vec<&str>, status: TestCaseStatus) -> NewTestCase {
        NewTestCase {
            project_id: Some("p1".to_string()),
            test_plan_id: None,
            user_story_id: "US-1".to_string(),
            code: "TC-001".to_string(),
            title: "Pay with card".to_string(),
            steps: vec!["Open cart".to_string(), "Pay".to_string()],
            expected_result: "Payment accepted".to_string(),
            test_type: "Funcional".to_string(),
            status,
            cycle: 1,
            defect_ids: defects.into_iter().map(String::from).collect(),
            responsible: "Ana".to_string(),
        }
    }

    #[test]
    fn test_defects_escalate_not_executed_to_failed() {
        let case = new_case(vec!["INC-20240101-001"], TestCaseStatus::NotExecuted)
            .into_test_case("t1".to_string(), Utc::now());
        assert_eq!(case.status, TestCaseStatus::Failed);
    }

    #[test]
    fn test_defects_do_not_override_executed_status() {
        let case = new_case(vec!["INC-20240101-001"], TestCaseStatus::Blocked)
            .into_test_case("t1".to_string(), Utc::now());
        assert_eq!(case.status, TestCaseStatus::Blocked);
    }

    #[test]
    fn test_update_attaching_defect_escalates() {
        let mut case = new_case(vec![], TestCaseStatus::NotExecuted)
            .into_test_case("t1".to_string(), Utc::now());
        assert_eq!(case.status, TestCaseStatus::NotExecuted);

        TestCaseUpdate {
            defect_ids: Some(vec!["INC-20240101-002".to_string()]),
            ..Default::default()
        }
        .apply(&mut case, Utc::now());

        assert_eq!(case.status, TestCaseStatus::Failed);
        assert_eq!(case.steps.len(), 2);
    }

    #[test]
    fn test_status_wire_values() {
        let json = serde_json::to_string(&TestCaseStatus::NotExecuted).unwrap();
        assert_eq!(json, "\"No Ejecutado\"");
        assert!(!TestCaseStatus::NotExecuted.is_executed());
        assert!(TestCaseStatus::Blocked.is_executed());
    }

    #[test]
    fn test_evidence_requires_executed_result() {
        let evidence = NewEvidence {
            date: None,
            tester: "Ana".to_string(),
            steps: vec![],
            screenshots: vec![],
            result: TestCaseStatus::NotExecuted,
        };
        assert!(evidence.validate().is_err());
    }
}
