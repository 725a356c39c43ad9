//! Analyst, team and cell integrity over HTTP.

use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_analyst_with_unknown_cell_is_not_written() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;

    let (status, body) = post(
        &app,
        "/api/v1/analysts",
        json!({"name": "Luis", "email": "luis@example.com", "cellIds": ["no-such-cell"]}),
    )
    .await;

    assert_eq!(status, 409, "{}", body);
    assert_eq!(body["error"], "CONSTRAINT_VIOLATION");
    let (_, analysts) = get(&app, "/api/v1/analysts").await;
    assert!(analysts.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_partial_update_keeps_other_fields() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;
    let id = create(
        &app,
        "/api/v1/analysts",
        json!({"name": "Marta", "email": "marta@example.com", "role": "Lider", "availability": 80}),
    )
    .await;

    let (status, updated) = patch(
        &app,
        &format!("/api/v1/analysts/{}", id),
        json!({"availability": 50}),
    )
    .await;

    assert_eq!(status, 200, "{}", updated);
    assert_eq!(updated["availability"], 50);
    assert_eq!(updated["name"], "Marta");
    assert_eq!(updated["email"], "marta@example.com");
    assert_eq!(updated["role"], "Lider");
}

#[actix_rt::test]
async fn test_cell_cascade_and_team_guard() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;
    let team_id = create(&app, "/api/v1/teams", json!({"name": "Retail"})).await;
    let cell_id = create(
        &app,
        "/api/v1/cells",
        json!({"name": "Cards", "teamId": team_id}),
    )
    .await;
    let analyst_id = create(
        &app,
        "/api/v1/analysts",
        json!({"name": "Pablo", "email": "pablo@example.com", "cellIds": [cell_id]}),
    )
    .await;

    let (_, in_cell) = get(&app, &format!("/api/v1/analysts?cellId={}", cell_id)).await;
    assert_eq!(in_cell.as_array().unwrap().len(), 1);

    let (status, body) = delete(&app, &format!("/api/v1/teams/{}", team_id)).await;
    assert_eq!(status, 409, "{}", body);

    let (status, _) = delete(&app, &format!("/api/v1/cells/{}", cell_id)).await;
    assert_eq!(status, 204);
    let (_, analyst) = get(&app, &format!("/api/v1/analysts/{}", analyst_id)).await;
    assert!(analyst["cellIds"].as_array().unwrap().is_empty());

    let (status, _) = delete(&app, &format!("/api/v1/teams/{}", team_id)).await;
    assert_eq!(status, 204);
    let (status, body) = get(&app, &format!("/api/v1/teams/{}", team_id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_workload_route_is_not_an_id() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;
    let analyst_id = create(
        &app,
        "/api/v1/analysts",
        json!({"name": "Rosa", "email": "rosa@example.com"}),
    )
    .await;
    create(
        &app,
        "/api/v1/projects",
        json!({
            "name": "Mobile onboarding",
            "status": "En Progreso",
            "estimatedHours": 40.0,
            "analystIds": [analyst_id],
        }),
    )
    .await;

    let (status, workload) = get(&app, "/api/v1/analysts/workload").await;

    assert_eq!(status, 200, "{}", workload);
    let row = &workload.as_array().unwrap()[0];
    assert_eq!(row["analystId"], analyst_id.as_str());
    assert_eq!(row["assignedProjects"], 1);
    assert_eq!(row["activeProjects"], 1);
    assert_eq!(row["activeEstimatedHours"], 40.0);

    let (_, projects) = get(&app, &format!("/api/v1/analysts/{}/projects", analyst_id)).await;
    assert_eq!(projects.as_array().unwrap().len(), 1);
}
