//! Test plans, quality scoring and CSV exports over HTTP.

use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_plan_quality_recompute_and_export() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;
    let project_id = create(&app, "/api/v1/projects", json!({"name": "Transfers"})).await;
    let plan_id = create(
        &app,
        "/api/v1/test-plans",
        json!({"projectId": project_id, "name": "Release 2"}),
    )
    .await;

    let (_, plan) = get(&app, &format!("/api/v1/test-plans/{}", plan_id)).await;
    assert_eq!(plan["totalCases"], 0);
    assert_eq!(plan["qualityScore"], -1.0);

    let case_id = create(
        &app,
        "/api/v1/test-cases",
        json!({
            "projectId": project_id,
            "testPlanId": plan_id,
            "code": "TC-1",
            "title": "Transfer between own accounts",
            "testType": "Funcional",
        }),
    )
    .await;
    create(
        &app,
        "/api/v1/test-cases",
        json!({
            "projectId": project_id,
            "testPlanId": plan_id,
            "code": "TC-2",
            "title": "Transfer to third party",
            "testType": "Funcional",
            "cycle": 2,
        }),
    )
    .await;

    let (status, case) = post(
        &app,
        &format!("/api/v1/test-cases/{}/evidence", case_id),
        json!({"tester": "Ana", "result": "Exitoso"}),
    )
    .await;
    assert_eq!(status, 201, "{}", case);
    assert_eq!(case["status"], "Exitoso");
    assert_eq!(case["evidence"].as_array().unwrap().len(), 1);

    // coverage 50, effectiveness 100, defects 100, diversity 20
    let (status, quality) = get(&app, &format!("/api/v1/test-plans/{}/quality", plan_id)).await;
    assert_eq!(status, 200);
    assert_eq!(quality["score"], 74.5);
    let (_, scoped) = get(
        &app,
        &format!("/api/v1/quality?testPlanId={}&cycle=1", plan_id),
    )
    .await;
    assert_eq!(scoped["totalCases"], 1);
    let (_, empty) = get(&app, "/api/v1/quality?projectId=nothing").await;
    assert_eq!(empty["score"], -1.0);

    let (status, recomputed) = post(
        &app,
        &format!("/api/v1/test-plans/{}/recompute", plan_id),
        json!({}),
    )
    .await;
    assert_eq!(status, 200, "{}", recomputed);
    assert_eq!(recomputed["cycles"].as_array().unwrap().len(), 2);
    assert_eq!(recomputed["totalCases"], 2);

    let (status, csv) = get(&app, &format!("/api/v1/exports/test-plans/{}.csv", plan_id)).await;
    assert_eq!(status, 200);
    let csv = csv.as_str().unwrap();
    assert!(csv.starts_with("code,title"));
    assert!(csv.trim_end().ends_with("qualityScore,74.50"));
}

#[actix_rt::test]
async fn test_incident_export_is_csv() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;
    create(
        &app,
        "/api/v1/incidents",
        json!({"descripcion": "Login loop", "cliente": "Acme"}),
    )
    .await;

    let req = actix_web::test::TestRequest::get()
        .uri("/api/v1/exports/incidents.csv")
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 200);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let body = actix_web::test::read_body(resp).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(body.lines().count(), 2);
    assert!(body.contains("Login loop"));
}

#[actix_rt::test]
async fn test_deleting_plan_keeps_cases() {
    let (_dir, services) = file_services();
    let app = create_test_app(&services).await;
    let project_id = create(&app, "/api/v1/projects", json!({"name": "Cards"})).await;
    let plan_id = create(
        &app,
        "/api/v1/test-plans",
        json!({"projectId": project_id, "name": "Sprint 4"}),
    )
    .await;
    let case_id = create(
        &app,
        "/api/v1/test-cases",
        json!({"testPlanId": plan_id, "title": "Block card"}),
    )
    .await;

    let (status, _) = delete(&app, &format!("/api/v1/test-plans/{}", plan_id)).await;
    assert_eq!(status, 204);

    let (status, case) = get(&app, &format!("/api/v1/test-cases/{}", case_id)).await;
    assert_eq!(status, 200);
    assert!(case.get("testPlanId").map_or(true, |v| v.is_null()));
}
