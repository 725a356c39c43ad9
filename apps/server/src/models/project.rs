//! Project and workload models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::analyst::dedup;
use super::{double_option, require_non_empty};
use crate::error::{AppError, AppResult};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Por Iniciar")]
    ToStart,
    #[serde(rename = "En Progreso")]
    InProgress,
    #[serde(rename = "Certificado")]
    Certified,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToStart => "to_start",
            Self::InProgress => "in_progress",
            Self::Certified => "certified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "to_start" => Some(Self::ToStart),
            "in_progress" => Some(Self::InProgress),
            "certified" => Some(Self::Certified),
            _ => None,
        }
    }
}

/// A project under QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Explicitly set status; overrides the date-derived one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    /// Derived on read.
    #[serde(default, skip_deserializing)]
    pub effective_status: ProjectStatus,
    #[serde(default)]
    pub analyst_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Status derived from dates unless one was set explicitly.
    pub fn compute_status(&self, today: NaiveDate) -> ProjectStatus {
        if let Some(status) = self.status {
            return status;
        }
        match (self.start_date, self.end_date) {
            (_, Some(end)) if end < today => ProjectStatus::Certified,
            (Some(start), _) if start > today => ProjectStatus::ToStart,
            (Some(_), _) => ProjectStatus::InProgress,
            (None, _) => ProjectStatus::ToStart,
        }
    }

    pub fn with_derived(mut self, today: NaiveDate) -> Self {
        self.effective_status = self.compute_status(today);
        self
    }
}

/// Request to create a project.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(default)]
    pub jira_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub cell_id: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub estimated_days: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub analyst_ids: Vec<String>,
}

impl NewProject {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        validate_estimates(self.estimated_hours, self.estimated_days)?;
        validate_range(self.start_date, self.end_date)
    }

    pub fn into_project(self, id: String, now: DateTime<Utc>) -> Project {
        Project {
            id,
            jira_id: self.jira_id,
            name: self.name.trim().to_string(),
            team_id: self.team_id,
            cell_id: self.cell_id,
            estimated_hours: self.estimated_hours,
            estimated_days: self.estimated_days,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            effective_status: ProjectStatus::default(),
            analyst_ids: dedup(self.analyst_ids),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a project. `null` clears optional fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub jira_id: Option<Option<String>>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub team_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cell_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub estimated_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub estimated_days: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<ProjectStatus>)]
    pub status: Option<Option<ProjectStatus>>,
    pub analyst_ids: Option<Vec<String>>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref name) = self.name {
            require_non_empty("name", name)?;
        }
        validate_estimates(self.estimated_hours.flatten(), self.estimated_days.flatten())
    }

    /// Apply the patch, rejecting a resulting start date after the end date.
    pub fn apply(&self, project: &mut Project, now: DateTime<Utc>) -> AppResult<()> {
        let start_date = self.start_date.unwrap_or(project.start_date);
        let end_date = self.end_date.unwrap_or(project.end_date);
        validate_range(start_date, end_date)?;

        if let Some(ref jira_id) = self.jira_id {
            project.jira_id = jira_id.clone();
        }
        if let Some(ref name) = self.name {
            project.name = name.trim().to_string();
        }
        if let Some(ref team_id) = self.team_id {
            project.team_id = team_id.clone();
        }
        if let Some(ref cell_id) = self.cell_id {
            project.cell_id = cell_id.clone();
        }
        if let Some(hours) = self.estimated_hours {
            project.estimated_hours = hours;
        }
        if let Some(days) = self.estimated_days {
            project.estimated_days = days;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(ref analyst_ids) = self.analyst_ids {
            project.analyst_ids = dedup(analyst_ids.clone());
        }
        project.start_date = start_date;
        project.end_date = end_date;
        project.updated_at = now;
        Ok(())
    }
}

/// Workload summary for one analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalystWorkload {
    pub analyst_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<u8>,
    pub assigned_projects: u32,
    pub active_projects: u32,
    pub active_estimated_hours: f64,
}

fn validate_estimates(hours: Option<f64>, days: Option<f64>) -> AppResult<()> {
    for (field, value) in [("estimatedHours", hours), ("estimatedDays", days)] {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(AppError::InvalidInput(format!(
                "{} must be a non-negative number",
                field
            )));
        }
    }
    Ok(())
}

pub(crate) fn validate_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(AppError::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Project {
        NewProject {
            jira_id: Some("QA-12".to_string()),
            name: "Checkout".to_string(),
            team_id: None,
            cell_id: None,
            estimated_hours: Some(40.0),
            estimated_days: Some(5.0),
            start_date: start,
            end_date: end,
            status: None,
            analyst_ids: vec![],
        }
        .into_project("p1".to_string(), Utc::now())
    }

    #[test]
    fn test_status_derived_from_dates() {
        let today = date(2024, 6, 15);
        assert_eq!(
            project(Some(date(2024, 7, 1)), None).compute_status(today),
            ProjectStatus::ToStart
        );
        assert_eq!(
            project(Some(date(2024, 6, 1)), Some(date(2024, 6, 30))).compute_status(today),
            ProjectStatus::InProgress
        );
        assert_eq!(
            project(Some(date(2024, 5, 1)), Some(date(2024, 6, 14))).compute_status(today),
            ProjectStatus::Certified
        );
        assert_eq!(project(None, None).compute_status(today), ProjectStatus::ToStart);
    }

    #[test]
    fn test_explicit_status_wins() {
        let mut p = project(Some(date(2024, 5, 1)), Some(date(2024, 5, 2)));
        p.status = Some(ProjectStatus::InProgress);
        assert_eq!(p.compute_status(date(2024, 6, 15)), ProjectStatus::InProgress);
    }

    #[test]
    fn test_update_rejects_inverted_range() {
        let mut p = project(Some(date(2024, 6, 1)), Some(date(2024, 6, 30)));
        let update: ProjectUpdate = serde_json::from_str(r#"{"endDate":"2024-05-01"}"#).unwrap();
        assert!(update.apply(&mut p, Utc::now()).is_err());
        assert_eq!(p.end_date, Some(date(2024, 6, 30)));
    }

    #[test]
    fn test_update_null_clears_jira_id() {
        let mut p = project(None, None);
        let update: ProjectUpdate = serde_json::from_str(r#"{"jiraId":null}"#).unwrap();
        update.apply(&mut p, Utc::now()).unwrap();
        assert_eq!(p.jira_id, None);
        assert_eq!(p.estimated_hours, Some(40.0));
    }
}
