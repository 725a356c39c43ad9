//! End-to-end: team -> cell -> analyst -> incident -> stats -> resolve.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_incident_lifecycle_over_http() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;

    let team_id = create(&app, "/api/v1/teams", json!({"name": "Core Banking"})).await;
    let cell_id = create(
        &app,
        "/api/v1/cells",
        json!({"name": "Payments", "teamId": team_id}),
    )
    .await;
    let analyst_id = create(
        &app,
        "/api/v1/analysts",
        json!({
            "name": "Ana Torres",
            "email": "ana@example.com",
            "role": "Senior",
            "cellIds": [cell_id],
        }),
    )
    .await;

    let (status, incident) = post(
        &app,
        "/api/v1/incidents",
        json!({
            "descripcion": "Transfer fails with timeout",
            "prioridad": "Alta",
            "cliente": "Acme",
            "celula": "Payments",
            "reportadoPor": analyst_id,
            "asignadoA": "Ana Torres",
        }),
    )
    .await;
    assert_eq!(status, 201, "{}", incident);
    let incident_id = incident["id"].as_str().unwrap().to_string();
    assert!(incident_id.starts_with("INC-"));
    assert_eq!(incident["estado"], "Abierto");
    assert_eq!(incident["diasAbierto"], 0);

    let (status, stats) = get(&app, "/api/v1/incidents/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["totalAbiertas"], 1);
    assert_eq!(stats["porPrioridad"]["alta"], 1);
    assert_eq!(stats["porCliente"]["Acme"], 1);

    // Resolve exactly three days after creation.
    let created: DateTime<Utc> = incident["fechaCreacion"].as_str().unwrap().parse().unwrap();
    let resolved = created + Duration::days(3);
    let (status, updated) = patch(
        &app,
        &format!("/api/v1/incidents/{}", incident_id),
        json!({
            "estado": "Resuelto",
            "fechaSolucion": resolved.to_rfc3339(),
            "comentario": "Retry policy fixed",
        }),
    )
    .await;
    assert_eq!(status, 200, "{}", updated);
    assert_eq!(updated["estado"], "Resuelto");
    assert_eq!(updated["diasAbierto"], 3);
    assert_eq!(updated["historialEstados"].as_array().unwrap().len(), 2);
    assert_eq!(updated["historialEstados"][1]["comentario"], "Retry policy fixed");

    // Days open stay fixed once resolved.
    let (_, fetched) = get(&app, &format!("/api/v1/incidents/{}", incident_id)).await;
    assert_eq!(fetched["diasAbierto"], 3);

    let (_, stats) = get(&app, "/api/v1/incidents/stats").await;
    assert_eq!(stats["totalAbiertas"], 0);
    assert_eq!(stats["totalResueltas"], 1);
    assert_eq!(stats["promedioDiasSolucion"], 3.0);

    let (status, resolved_only) = get(&app, "/api/v1/incidents?estado=Resuelto").await;
    assert_eq!(status, 200);
    assert_eq!(resolved_only.as_array().unwrap().len(), 1);
    let (_, open_only) = get(&app, "/api/v1/incidents?estado=Abierto").await;
    assert!(open_only.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_unknown_state_filter_is_rejected() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;

    let (status, body) = get(&app, "/api/v1/incidents?estado=Cerrado").await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_incident_ids_are_sequential_per_day() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;

    let mut ids = Vec::new();
    for n in 0..3 {
        let id = create(
            &app,
            "/api/v1/incidents",
            json!({"descripcion": format!("Incident {}", n)}),
        )
        .await;
        ids.push(id);
    }

    let prefix = format!("INC-{}-", Utc::now().format("%Y%m%d"));
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(id, &format!("{}{:03}", prefix, i + 1));
    }
}

#[actix_rt::test]
async fn test_malformed_body_is_invalid_input() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;

    let (status, body) = post(&app, "/api/v1/teams", json!({"description": "no name"})).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_health_without_database() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;

    let (status, body) = get(&app, "/api/v1/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/api/v1/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "not_configured");
}
