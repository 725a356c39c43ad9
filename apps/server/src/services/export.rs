//! CSV exports for incidents and test plans.

use csv::WriterBuilder;
use serde::Serialize;

use super::quality;
use crate::error::{AppError, AppResult};
use crate::models::{Incident, TestCase, TestPlan};

/// Label a value the way it is serialized on the wire, e.g. `Resuelto`.
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e.error())))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
}

/// One row per incident. Expects `days_open` to be derived already.
pub fn incidents_csv(incidents: &[Incident]) -> AppResult<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([
        "id",
        "estado",
        "prioridad",
        "descripcion",
        "cliente",
        "celula",
        "reportadoPor",
        "asignadoA",
        "fechaCreacion",
        "fechaReporte",
        "fechaSolucion",
        "diasAbierto",
    ])?;

    for incident in incidents {
        writer.write_record([
            incident.id.clone(),
            label(&incident.state),
            label(&incident.priority),
            incident.description.clone(),
            incident.client.clone(),
            incident.cell.clone(),
            incident.reported_by.clone().unwrap_or_default(),
            incident.assigned_to.clone(),
            incident.created_at.to_rfc3339(),
            incident.reported_at.to_rfc3339(),
            incident
                .resolved_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            incident.days_open.to_string(),
        ])?;
    }

    finish(writer)
}

/// One row per case, then a blank line and the plan's quality summary.
pub fn test_plan_csv(plan: &TestPlan, cases: &[TestCase]) -> AppResult<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record([
        "code",
        "title",
        "userStoryId",
        "testType",
        "cycle",
        "status",
        "defects",
        "responsible",
    ])?;

    for case in cases {
        writer.write_record([
            case.code.clone(),
            case.title.clone(),
            case.user_story_id.clone(),
            case.test_type.clone(),
            case.cycle.to_string(),
            label(&case.status),
            case.defect_ids.join(" "),
            case.responsible.clone(),
        ])?;
    }

    let breakdown = quality::score_test_cases(cases);
    writer.write_record([""])?;
    let summary = [
        ("testPlan", plan.name.clone()),
        ("totalCases", breakdown.total_cases.to_string()),
        ("executedCases", breakdown.executed_cases.to_string()),
        ("successfulCases", breakdown.successful_cases.to_string()),
        ("totalDefects", breakdown.total_defects.to_string()),
        ("coverage", format!("{:.2}", breakdown.coverage)),
        ("effectiveness", format!("{:.2}", breakdown.effectiveness)),
        ("defectScore", format!("{:.2}", breakdown.defect_score)),
        ("diversity", format!("{:.2}", breakdown.diversity)),
        ("qualityScore", format!("{:.2}", breakdown.score)),
    ];
    for (key, value) in summary {
        writer.write_record([key.to_string(), value])?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentState, NewIncident, Priority, TestCaseStatus};
    use chrono::{DateTime, Utc};

    fn at() -> DateTime<Utc> {
        "2024-03-09T08:30:00Z".parse().unwrap()
    }

    #[test]
    fn test_incident_rows_use_wire_labels() {
        let incident = NewIncident {
            state: IncidentState::InProgress,
            priority: Priority::High,
            description: "Checkout, then crash".to_string(),
            client: "Acme".to_string(),
            cell: "Payments".to_string(),
            reported_by: None,
            assigned_to: "Luis".to_string(),
            reported_at: None,
            attachments: vec![],
        }
        .to_incident("INC-20240309-001".to_string(), at());

        let csv = incidents_csv(&[incident]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,estado,prioridad"));
        assert!(lines[1].starts_with("INC-20240309-001,En Progreso,Alta,\"Checkout, then crash\""));
    }

    #[test]
    fn test_plan_export_ends_with_score() {
        let plan = TestPlan {
            id: "tp1".to_string(),
            project_id: "p1".to_string(),
            name: "Release 1".to_string(),
            start_date: None,
            end_date: None,
            cycles: vec![],
            total_cases: 0,
            quality_score: 0.0,
            created_at: at(),
            updated_at: at(),
        };
        let case = TestCase {
            id: "c1".to_string(),
            project_id: Some("p1".to_string()),
            test_plan_id: Some("tp1".to_string()),
            user_story_id: "HU-3".to_string(),
            code: "TC-1".to_string(),
            title: "Pay".to_string(),
            steps: vec![],
            expected_result: String::new(),
            test_type: "Funcional".to_string(),
            status: TestCaseStatus::Successful,
            cycle: 1,
            defect_ids: vec![],
            evidence: vec![],
            responsible: "Ana".to_string(),
            created_at: at(),
            updated_at: at(),
        };

        let csv = test_plan_csv(&plan, &[case]).unwrap();

        assert!(csv.contains("TC-1,Pay,HU-3,Funcional,1,Exitoso,,Ana"));
        // 35 + 35 + 20 + 2
        assert_eq!(csv.lines().last(), Some("qualityScore,92.00"));
    }

    #[test]
    fn test_non_utf8_output_is_an_internal_error() {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record([&b"\xff\xfe"[..]]).unwrap();

        let err = finish(writer).unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert!(!err.is_backend_failure());
    }

    #[test]
    fn test_empty_plan_reports_sentinel() {
        let plan = TestPlan {
            id: "tp1".to_string(),
            project_id: "p1".to_string(),
            name: "Empty".to_string(),
            start_date: None,
            end_date: None,
            cycles: vec![],
            total_cases: 0,
            quality_score: 0.0,
            created_at: at(),
            updated_at: at(),
        };
        let csv = test_plan_csv(&plan, &[]).unwrap();
        assert_eq!(csv.lines().last(), Some("qualityScore,-1.00"));
    }
}
