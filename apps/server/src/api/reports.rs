//! Quality scoring and CSV export endpoints.

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::services::{QualityBreakdown, QualityScope, Services, export};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

fn csv_attachment(filename: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(CSV_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}

/// Quality score over the test cases matching the filters.
///
/// Returns `score: -1` when no case matches.
#[utoipa::path(
    get,
    path = "/quality",
    tag = "Quality",
    params(QualityScope),
    responses(
        (status = 200, description = "Quality breakdown", body = QualityBreakdown),
    )
)]
pub async fn get_quality(
    services: web::Data<Services>,
    query: web::Query<QualityScope>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.quality(&query).await?))
}

/// Every incident as CSV.
#[utoipa::path(
    get,
    path = "/exports/incidents.csv",
    tag = "Exports",
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
    )
)]
pub async fn export_incidents(services: web::Data<Services>) -> AppResult<HttpResponse> {
    let incidents = services.incidents.list(None).await?;
    let body = export::incidents_csv(&incidents)?;
    Ok(csv_attachment("incidents.csv", body))
}

/// One test plan's cases as CSV, followed by its quality summary.
#[utoipa::path(
    get,
    path = "/exports/test-plans/{id}.csv",
    tag = "Exports",
    params(("id" = String, Path, description = "Test plan id")),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 404, description = "Test plan not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn export_test_plan(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let plan = services.test_plans.get(&path).await?;
    let cases = services.test_cases.list_by_plan(&plan.id).await?;
    let body = export::test_plan_csv(&plan, &cases)?;
    Ok(csv_attachment(&format!("test-plan-{}.csv", plan.id), body))
}

/// Configure quality and export routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/quality").route(web::get().to(get_quality)))
        .service(web::resource("/exports/incidents.csv").route(web::get().to(export_incidents)))
        .service(
            web::resource("/exports/test-plans/{id}.csv").route(web::get().to(export_test_plan)),
        );
}
