//! Analyst domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{double_option, require_non_empty};
use crate::error::{AppError, AppResult};

/// Default color assigned to analysts created without one.
pub const DEFAULT_ANALYST_COLOR: &str = "#3b82f6";

/// Analyst role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AnalystRole {
    #[default]
    #[serde(rename = "Analista")]
    Analyst,
    #[serde(rename = "Senior")]
    Senior,
    #[serde(rename = "Lider")]
    Leader,
}

impl AnalystRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyst => "analyst",
            Self::Senior => "senior",
            Self::Leader => "leader",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "analyst" => Some(Self::Analyst),
            "senior" => Some(Self::Senior),
            "leader" => Some(Self::Leader),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalystRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A QA analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analyst {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: AnalystRole,
    #[serde(default)]
    pub color: String,
    /// Cells the analyst belongs to.
    #[serde(default)]
    pub cell_ids: Vec<String>,
    /// Availability percentage (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create an analyst.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalyst {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: AnalystRole,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub cell_ids: Vec<String>,
    #[serde(default)]
    pub availability: Option<u8>,
}

impl NewAnalyst {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        validate_email(&self.email)?;
        validate_availability(self.availability)
    }

    pub fn into_analyst(self, id: String, now: DateTime<Utc>) -> Analyst {
        Analyst {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role,
            color: self
                .color
                .unwrap_or_else(|| DEFAULT_ANALYST_COLOR.to_string()),
            cell_ids: dedup(self.cell_ids),
            availability: self.availability,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an analyst. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalystUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AnalystRole>,
    pub color: Option<String>,
    pub cell_ids: Option<Vec<String>>,
    /// `null` clears the availability.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u8>)]
    pub availability: Option<Option<u8>>,
}

impl AnalystUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref name) = self.name {
            require_non_empty("name", name)?;
        }
        if let Some(ref email) = self.email {
            validate_email(email)?;
        }
        if let Some(availability) = self.availability {
            validate_availability(availability)?;
        }
        Ok(())
    }

    pub fn apply(&self, analyst: &mut Analyst, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            analyst.name = name.trim().to_string();
        }
        if let Some(ref email) = self.email {
            analyst.email = email.trim().to_string();
        }
        if let Some(role) = self.role {
            analyst.role = role;
        }
        if let Some(ref color) = self.color {
            analyst.color = color.clone();
        }
        if let Some(ref cell_ids) = self.cell_ids {
            analyst.cell_ids = dedup(cell_ids.clone());
        }
        if let Some(availability) = self.availability {
            analyst.availability = availability;
        }
        analyst.updated_at = now;
    }
}

fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        ))),
    }
}

fn validate_availability(availability: Option<u8>) -> AppResult<()> {
    match availability {
        Some(value) if value > 100 => Err(AppError::InvalidInput(
            "availability must be between 0 and 100".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Remove duplicate ids while keeping first-seen order.
pub(crate) fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
