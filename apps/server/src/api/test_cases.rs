//! Test case API handlers.

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::models::{NewEvidence, NewTestCase, TestCase, TestCaseUpdate};
use crate::services::{QualityScope, Services};

/// List test cases, optionally narrowed by project, plan and cycle.
#[utoipa::path(
    get,
    path = "/test-cases",
    tag = "Test Cases",
    params(QualityScope),
    responses(
        (status = 200, description = "Matching test cases", body = Vec<TestCase>),
    )
)]
pub async fn list_test_cases(
    services: web::Data<Services>,
    query: web::Query<QualityScope>,
) -> AppResult<HttpResponse> {
    let cases = services.test_cases.list_matching(&query).await?;
    Ok(HttpResponse::Ok().json(cases))
}

/// Create a test case. A referenced test plan must exist.
#[utoipa::path(
    post,
    path = "/test-cases",
    tag = "Test Cases",
    request_body = NewTestCase,
    responses(
        (status = 201, description = "Test case created", body = TestCase),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown test plan", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_test_case(
    services: web::Data<Services>,
    body: web::Json<NewTestCase>,
) -> AppResult<HttpResponse> {
    let case = services.test_cases.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(case))
}

#[utoipa::path(
    get,
    path = "/test-cases/{id}",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case id")),
    responses(
        (status = 200, description = "Test case found", body = TestCase),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_test_case(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.test_cases.get(&path).await?))
}

/// Partially update a test case. `testPlanId: null` unlinks it from its plan.
#[utoipa::path(
    patch,
    path = "/test-cases/{id}",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case id")),
    request_body = TestCaseUpdate,
    responses(
        (status = 200, description = "Test case updated", body = TestCase),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown test plan", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_test_case(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<TestCaseUpdate>,
) -> AppResult<HttpResponse> {
    let case = services.test_cases.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(case))
}

#[utoipa::path(
    delete,
    path = "/test-cases/{id}",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case id")),
    responses(
        (status = 204, description = "Test case deleted"),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_test_case(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.test_cases.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Record an execution. The case status becomes the evidence result.
#[utoipa::path(
    post,
    path = "/test-cases/{id}/evidence",
    tag = "Test Cases",
    params(("id" = String, Path, description = "Test case id")),
    request_body = NewEvidence,
    responses(
        (status = 201, description = "Evidence recorded", body = TestCase),
        (status = 400, description = "Invalid evidence", body = crate::error::ErrorResponse),
        (status = 404, description = "Test case not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn add_evidence(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<NewEvidence>,
) -> AppResult<HttpResponse> {
    let case = services.test_cases.add_evidence(&path, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(case))
}

/// Configure test case routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/test-cases")
            .route(web::get().to(list_test_cases))
            .route(web::post().to(create_test_case)),
    )
    .service(
        web::resource("/test-cases/{id}")
            .route(web::get().to(get_test_case))
            .route(web::patch().to(update_test_case))
            .route(web::delete().to(delete_test_case)),
    )
    .service(web::resource("/test-cases/{id}/evidence").route(web::post().to(add_evidence)));
}
