//! Shared helpers for the API tests.

use std::sync::Arc;

use actix_web::{App, dev::ServiceResponse, test, web};
use qa_manager_lib::api;
use qa_manager_lib::config::StorageSettings;
use qa_manager_lib::db::DbPool;
use qa_manager_lib::file_store::FileStore;
use qa_manager_lib::models::EntityKind;
use qa_manager_lib::services::Services;
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::Value;
use tempfile::TempDir;

/// Services backed only by JSON files under a fresh temp directory.
pub fn file_services() -> (TempDir, Services) {
    let dir = TempDir::new().unwrap();
    let services = Services::file_only(dir.path()).unwrap();
    (dir, services)
}

/// Every entity type on a database whose every call fails, with fallback to
/// the JSON files enabled.
pub fn fallback_services() -> (TempDir, Services) {
    let dir = TempDir::new().unwrap();
    let settings = StorageSettings {
        data_dir: dir.path().to_path_buf(),
        postgres_entities: EntityKind::ALL.to_vec(),
        fallback_enabled: true,
    };
    // A mock with no prepared results fails every query and exec.
    let broken =
        DbPool::from_connection(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let file = Arc::new(FileStore::new(dir.path()));
    let services = Services::new(&settings, Some(Arc::new(broken)), file).unwrap();
    (dir, services)
}

/// Create a test app serving `/api/v1`.
pub async fn create_test_app(
    services: &Services,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(services.clone()))
            .app_data(api::json_config())
            .app_data(api::query_config())
            .service(web::scope("/api/v1").configure(api::configure_api)),
    )
    .await
}

async fn send<S>(app: &S, req: test::TestRequest) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    send(app, test::TestRequest::get().uri(uri)).await
}

pub async fn post<S>(app: &S, uri: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    send(app, test::TestRequest::post().uri(uri).set_json(body)).await
}

pub async fn patch<S>(app: &S, uri: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    send(app, test::TestRequest::patch().uri(uri).set_json(body)).await
}

pub async fn delete<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    send(app, test::TestRequest::delete().uri(uri)).await
}

/// Create a record and return its id, asserting a 201.
pub async fn create<S>(app: &S, uri: &str, body: Value) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = post(app, uri, body).await;
    assert_eq!(status, 201, "POST {} failed: {}", uri, body);
    body["id"].as_str().unwrap().to_string()
}

/// Drop fields that legitimately differ between two runs.
pub fn without_volatile(mut value: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        for key in [
            "id",
            "createdAt",
            "updatedAt",
            "fechaCreacion",
            "fechaReporte",
            "historialEstados",
        ] {
            object.remove(key);
        }
    }
    value
}
