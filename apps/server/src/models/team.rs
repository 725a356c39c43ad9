//! Team and cell models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::analyst::dedup;
use super::require_non_empty;
use crate::error::AppResult;

/// A QA team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Analysts that belong to the team.
    #[serde(default)]
    pub member_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a team.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl NewTeam {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)
    }

    pub fn into_team(self, id: String, now: DateTime<Utc>) -> Team {
        Team {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            member_ids: dedup(self.member_ids),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a team.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub member_ids: Option<Vec<String>>,
}

impl TeamUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref name) = self.name {
            require_non_empty("name", name)?;
        }
        Ok(())
    }

    pub fn apply(&self, team: &mut Team, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            team.name = name.trim().to_string();
        }
        if let Some(ref description) = self.description {
            team.description = description.clone();
        }
        if let Some(ref member_ids) = self.member_ids {
            team.member_ids = dedup(member_ids.clone());
        }
        team.updated_at = now;
    }
}

/// An organizational sub-unit of a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: String,
    pub name: String,
    /// Owning team. Must reference an existing team.
    pub team_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a cell.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCell {
    pub name: String,
    pub team_id: String,
}

impl NewCell {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("teamId", &self.team_id)
    }

    pub fn into_cell(self, id: String, now: DateTime<Utc>) -> Cell {
        Cell {
            id,
            name: self.name.trim().to_string(),
            team_id: self.team_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a cell.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    pub name: Option<String>,
    pub team_id: Option<String>,
}

impl CellUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref name) = self.name {
            require_non_empty("name", name)?;
        }
        if let Some(ref team_id) = self.team_id {
            require_non_empty("teamId", team_id)?;
        }
        Ok(())
    }

    pub fn apply(&self, cell: &mut Cell, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            cell.name = name.trim().to_string();
        }
        if let Some(ref team_id) = self.team_id {
            cell.team_id = team_id.clone();
        }
        cell.updated_at = now;
    }
}
