//! Test plan API handlers.
//!
//! Plans are served with `totalCases` and `qualityScore` computed from their
//! linked test cases.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::models::{NewTestPlan, TestPlan, TestPlanUpdate};
use crate::services::{QualityBreakdown, Services};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TestPlanQuery {
    /// Only plans of this project
    pub project_id: Option<String>,
}

/// Query parameters for cycle recomputation.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecomputeQuery {
    /// Write the recomputed cycles back (default true)
    pub persist: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/test-plans",
    tag = "Test Plans",
    params(TestPlanQuery),
    responses(
        (status = 200, description = "Matching test plans", body = Vec<TestPlan>),
    )
)]
pub async fn list_test_plans(
    services: web::Data<Services>,
    query: web::Query<TestPlanQuery>,
) -> AppResult<HttpResponse> {
    let plans = match query.into_inner().project_id {
        Some(project_id) => services.test_plans.list_by_project(&project_id).await?,
        None => services.test_plans.list().await?,
    };
    Ok(HttpResponse::Ok().json(plans))
}

/// Create a test plan for an existing project.
#[utoipa::path(
    post,
    path = "/test-plans",
    tag = "Test Plans",
    request_body = NewTestPlan,
    responses(
        (status = 201, description = "Test plan created", body = TestPlan),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown project", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_test_plan(
    services: web::Data<Services>,
    body: web::Json<NewTestPlan>,
) -> AppResult<HttpResponse> {
    let plan = services.test_plans.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(plan))
}

#[utoipa::path(
    get,
    path = "/test-plans/{id}",
    tag = "Test Plans",
    params(("id" = String, Path, description = "Test plan id")),
    responses(
        (status = 200, description = "Test plan found", body = TestPlan),
        (status = 404, description = "Test plan not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_test_plan(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.test_plans.get(&path).await?))
}

#[utoipa::path(
    patch,
    path = "/test-plans/{id}",
    tag = "Test Plans",
    params(("id" = String, Path, description = "Test plan id")),
    request_body = TestPlanUpdate,
    responses(
        (status = 200, description = "Test plan updated", body = TestPlan),
        (status = 404, description = "Test plan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown project", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_test_plan(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<TestPlanUpdate>,
) -> AppResult<HttpResponse> {
    let plan = services.test_plans.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(plan))
}

/// Delete a test plan. Its cases are kept and unlinked.
#[utoipa::path(
    delete,
    path = "/test-plans/{id}",
    tag = "Test Plans",
    params(("id" = String, Path, description = "Test plan id")),
    responses(
        (status = 204, description = "Test plan deleted"),
        (status = 404, description = "Test plan not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_test_plan(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.test_plans.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Quality breakdown of one plan's cases.
#[utoipa::path(
    get,
    path = "/test-plans/{id}/quality",
    tag = "Test Plans",
    params(("id" = String, Path, description = "Test plan id")),
    responses(
        (status = 200, description = "Quality breakdown", body = QualityBreakdown),
        (status = 404, description = "Test plan not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_test_plan_quality(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.test_plans.quality(&path).await?))
}

/// Rebuild the per-cycle counts from the plan's cases.
#[utoipa::path(
    post,
    path = "/test-plans/{id}/recompute",
    tag = "Test Plans",
    params(
        ("id" = String, Path, description = "Test plan id"),
        RecomputeQuery,
    ),
    responses(
        (status = 200, description = "Plan with recomputed cycles", body = TestPlan),
        (status = 404, description = "Test plan not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn recompute_test_plan(
    services: web::Data<Services>,
    path: web::Path<String>,
    query: web::Query<RecomputeQuery>,
) -> AppResult<HttpResponse> {
    let persist = query.persist.unwrap_or(true);
    Ok(HttpResponse::Ok().json(services.test_plans.recompute(&path, persist).await?))
}

/// Configure test plan routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/test-plans")
            .route(web::get().to(list_test_plans))
            .route(web::post().to(create_test_plan)),
    )
    .service(
        web::resource("/test-plans/{id}")
            .route(web::get().to(get_test_plan))
            .route(web::patch().to(update_test_plan))
            .route(web::delete().to(delete_test_plan)),
    )
    .service(
        web::resource("/test-plans/{id}/quality").route(web::get().to(get_test_plan_quality)),
    )
    .service(
        web::resource("/test-plans/{id}/recompute").route(web::post().to(recompute_test_plan)),
    );
}
