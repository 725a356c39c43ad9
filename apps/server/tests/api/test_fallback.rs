//! A failing database with fallback enabled behaves like the file backend.

use serde_json::{Value, json};

use super::test_helpers::*;

/// Run the same sequence of calls and collect every response.
async fn run_scenario<S>(app: &S) -> Vec<(u16, Value)>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut responses = Vec::new();

    let team_id = create(app, "/api/v1/teams", json!({"name": "Lending"})).await;
    let cell_id = create(
        app,
        "/api/v1/cells",
        json!({"name": "Mortgages", "teamId": team_id}),
    )
    .await;
    let (status, analyst) = post(
        app,
        "/api/v1/analysts",
        json!({"name": "Iris", "email": "iris@example.com", "cellIds": [cell_id]}),
    )
    .await;
    let mut analyst = without_volatile(analyst);
    // Cell ids are generated per run; only the count is comparable.
    analyst["cellIds"] = json!(analyst["cellIds"].as_array().map(Vec::len));
    responses.push((status, analyst));
    responses.push(
        post(
            app,
            "/api/v1/analysts",
            json!({"name": "Bad", "email": "bad@example.com", "cellIds": ["missing"]}),
        )
        .await,
    );
    let (status, incident) = post(
        app,
        "/api/v1/incidents",
        json!({"descripcion": "Rate shown twice", "prioridad": "Baja", "celula": "Mortgages"}),
    )
    .await;
    responses.push((status, without_volatile(incident)));
    responses.push(get(app, "/api/v1/incidents/stats").await);
    responses.push(get(app, "/api/v1/teams/missing").await);

    let (status, cells) = get(app, "/api/v1/cells").await;
    let names: Vec<Value> = cells
        .as_array()
        .unwrap()
        .iter()
        .map(|cell| cell["name"].clone())
        .collect();
    responses.push((status, json!(names)));

    responses
}

#[actix_rt::test]
async fn test_fallback_matches_file_only() {
    let (_file_dir, file_only) = file_services();
    let (fallback_dir, with_fallback) = fallback_services();

    let expected = run_scenario(&create_test_app(&file_only).await).await;
    let actual = run_scenario(&create_test_app(&with_fallback).await).await;

    assert_eq!(actual, expected);
    // Writes landed in the JSON files.
    assert!(fallback_dir.path().join("incidents.json").exists());
    assert!(fallback_dir.path().join("analysts.json").exists());
}

#[actix_rt::test]
async fn test_failing_database_without_fallback_is_a_server_error() {
    use std::sync::Arc;

    use qa_manager_lib::config::StorageSettings;
    use qa_manager_lib::db::DbPool;
    use qa_manager_lib::file_store::FileStore;
    use qa_manager_lib::models::EntityKind;
    use qa_manager_lib::services::Services;
    use sea_orm::{DatabaseBackend, MockDatabase};

    let dir = tempfile::TempDir::new().unwrap();
    let settings = StorageSettings {
        data_dir: dir.path().to_path_buf(),
        postgres_entities: vec![EntityKind::Teams],
        fallback_enabled: false,
    };
    let broken =
        DbPool::from_connection(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let services = Services::new(
        &settings,
        Some(Arc::new(broken)),
        Arc::new(FileStore::new(dir.path())),
    )
    .unwrap();
    let app = create_test_app(&services).await;

    let (status, body) = get(&app, "/api/v1/teams").await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "DATABASE_ERROR");

    // Entity types left on files are unaffected.
    let (status, _) = get(&app, "/api/v1/incidents").await;
    assert_eq!(status, 200);
}
