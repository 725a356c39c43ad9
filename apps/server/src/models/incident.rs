//! Incident (bug report) domain models.
//!
//! Incident JSON keeps the Spanish field names of the legacy data files
//! (`estado`, `descripcion`, `fechaSolucion`, ...).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{double_option, require_non_empty};
use crate::error::AppResult;

/// Incident lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum IncidentState {
    #[default]
    #[serde(rename = "Abierto")]
    Open,
    #[serde(rename = "En Progreso")]
    InProgress,
    #[serde(rename = "Resuelto")]
    Resolved,
}

impl IncidentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncidentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Incident priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Priority {
    #[serde(rename = "Alta")]
    High,
    #[default]
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// One entry of the append-only state history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StateChange {
    #[serde(rename = "estado")]
    pub state: IncidentState,
    #[serde(rename = "fecha")]
    pub changed_at: DateTime<Utc>,
    #[serde(rename = "comentario", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A tracked incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Incident {
    /// `INC-YYYYMMDD-NNN`
    pub id: String,
    #[serde(rename = "estado")]
    pub state: IncidentState,
    #[serde(rename = "prioridad")]
    pub priority: Priority,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "cliente", default)]
    pub client: String,
    /// Name of the cell the incident is filed under.
    #[serde(rename = "celula", default)]
    pub cell: String,
    /// Reporting analyst id.
    #[serde(rename = "reportadoPor", default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
    /// Assignee display name (free text).
    #[serde(rename = "asignadoA", default)]
    pub assigned_to: String,
    #[serde(rename = "fechaCreacion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fechaReporte")]
    pub reported_at: DateTime<Utc>,
    #[serde(rename = "fechaSolucion", default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Derived on read; never trusted from storage.
    #[serde(rename = "diasAbierto", default, skip_deserializing)]
    pub days_open: i64,
    #[serde(rename = "historialEstados", default)]
    pub history: Vec<StateChange>,
    #[serde(rename = "adjuntos", default)]
    pub attachments: Vec<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Whole days the incident has been (or was) open.
    pub fn compute_days_open(&self, now: DateTime<Utc>) -> i64 {
        let end = self.resolved_at.unwrap_or(now);
        (end - self.created_at).num_days().max(0)
    }

    /// Fill derived fields.
    pub fn with_derived(mut self, now: DateTime<Utc>) -> Self {
        self.days_open = self.compute_days_open(now);
        self
    }
}

/// Request to create an incident.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewIncident {
    #[serde(rename = "estado", default)]
    pub state: IncidentState,
    #[serde(rename = "prioridad", default)]
    pub priority: Priority,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "cliente", default)]
    pub client: String,
    #[serde(rename = "celula", default)]
    pub cell: String,
    #[serde(rename = "reportadoPor", default)]
    pub reported_by: Option<String>,
    #[serde(rename = "asignadoA", default)]
    pub assigned_to: String,
    #[serde(rename = "fechaReporte", default)]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(rename = "adjuntos", default)]
    pub attachments: Vec<String>,
}

impl NewIncident {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("descripcion", &self.description)
    }

    /// Build the stored record. The id is assigned by the backend.
    pub fn to_incident(&self, id: String, now: DateTime<Utc>) -> Incident {
        Incident {
            id,
            state: self.state,
            priority: self.priority,
            description: self.description.trim().to_string(),
            client: self.client.clone(),
            cell: self.cell.clone(),
            reported_by: self.reported_by.clone(),
            assigned_to: self.assigned_to.clone(),
            created_at: now,
            reported_at: self.reported_at.unwrap_or(now),
            resolved_at: (self.state == IncidentState::Resolved).then_some(now),
            days_open: 0,
            history: vec![StateChange {
                state: self.state,
                changed_at: now,
                comment: None,
            }],
            attachments: self.attachments.clone(),
            updated_at: now,
        }
    }
}

/// Partial update for an incident.
///
/// A state change appends to the history. Entering `Resuelto` stamps
/// `fechaSolucion` (the provided value, or now); leaving it clears the date.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct IncidentUpdate {
    #[serde(rename = "estado", default)]
    pub state: Option<IncidentState>,
    #[serde(rename = "prioridad", default)]
    pub priority: Option<Priority>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "cliente", default)]
    pub client: Option<String>,
    #[serde(rename = "celula", default)]
    pub cell: Option<String>,
    #[serde(rename = "reportadoPor", default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub reported_by: Option<Option<String>>,
    #[serde(rename = "asignadoA", default)]
    pub assigned_to: Option<String>,
    #[serde(rename = "fechaReporte", default)]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(rename = "fechaSolucion", default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(rename = "adjuntos", default)]
    pub attachments: Option<Vec<String>>,
    /// Comment recorded with a state change.
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
}

impl IncidentUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref description) = self.description {
            require_non_empty("descripcion", description)?;
        }
        Ok(())
    }

    pub fn apply(&self, incident: &mut Incident, now: DateTime<Utc>) {
        if let Some(priority) = self.priority {
            incident.priority = priority;
        }
        if let Some(ref description) = self.description {
            incident.description = description.trim().to_string();
        }
        if let Some(ref client) = self.client {
            incident.client = client.clone();
        }
        if let Some(ref cell) = self.cell {
            incident.cell = cell.clone();
        }
        if let Some(ref reported_by) = self.reported_by {
            incident.reported_by = reported_by.clone();
        }
        if let Some(ref assigned_to) = self.assigned_to {
            incident.assigned_to = assigned_to.clone();
        }
        if let Some(reported_at) = self.reported_at {
            incident.reported_at = reported_at;
        }
        if let Some(ref attachments) = self.attachments {
            incident.attachments = attachments.clone();
        }

        match self.state {
            Some(state) if state != incident.state => {
                incident.history.push(StateChange {
                    state,
                    changed_at: now,
                    comment: self.comment.clone(),
                });
                incident.state = state;
                incident.resolved_at = if state == IncidentState::Resolved {
                    Some(self.resolved_at.unwrap_or(now))
                } else {
                    None
                };
            }
            _ => {
                // Correcting the resolution date of an already resolved incident.
                if incident.state == IncidentState::Resolved && self.resolved_at.is_some() {
                    incident.resolved_at = self.resolved_at;
                }
            }
        }

        incident.updated_at = now;
    }
}

/// Incident counts per priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriorityCounts {
    pub alta: u64,
    pub media: u64,
    pub baja: u64,
}

/// Aggregated incident statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStats {
    pub total: u64,
    pub total_abiertas: u64,
    pub total_en_progreso: u64,
    pub total_resueltas: u64,
    pub por_prioridad: PriorityCounts,
    pub por_cliente: BTreeMap<String, u64>,
    pub por_celula: BTreeMap<String, u64>,
    /// Mean days open over resolved incidents; absent when none are resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promedio_dias_solucion: Option<f64>,
}

impl IncidentStats {
    pub fn from_incidents(incidents: &[Incident], now: DateTime<Utc>) -> Self {
        let mut stats = IncidentStats::default();
        let mut resolved_days = Vec::new();

        for incident in incidents {
            stats.total += 1;
            match incident.state {
                IncidentState::Open => stats.total_abiertas += 1,
                IncidentState::InProgress => stats.total_en_progreso += 1,
                IncidentState::Resolved => {
                    stats.total_resueltas += 1;
                    resolved_days.push(incident.compute_days_open(now));
                }
            }
            match incident.priority {
                Priority::High => stats.por_prioridad.alta += 1,
                Priority::Medium => stats.por_prioridad.media += 1,
                Priority::Low => stats.por_prioridad.baja += 1,
            }
            if !incident.client.is_empty() {
                *stats.por_cliente.entry(incident.client.clone()).or_default() += 1;
            }
            if !incident.cell.is_empty() {
                *stats.por_celula.entry(incident.cell.clone()).or_default() += 1;
            }
        }

        if !resolved_days.is_empty() {
            let sum: i64 = resolved_days.iter().sum();
            stats.promedio_dias_solucion = Some(sum as f64 / resolved_days.len() as f64);
        }

        stats
    }
}
