//! Analyst API handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::models::{Analyst, AnalystUpdate, AnalystWorkload, NewAnalyst, Project};
use crate::services::Services;

/// Query parameters for listing analysts.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalystQuery {
    /// Only analysts belonging to this cell
    pub cell_id: Option<String>,
}

/// List analysts, optionally for one cell.
#[utoipa::path(
    get,
    path = "/analysts",
    tag = "Analysts",
    params(AnalystQuery),
    responses(
        (status = 200, description = "Matching analysts", body = Vec<Analyst>),
    )
)]
pub async fn list_analysts(
    services: web::Data<Services>,
    query: web::Query<AnalystQuery>,
) -> AppResult<HttpResponse> {
    let analysts = match query.into_inner().cell_id {
        Some(cell_id) => services.analysts.list_by_cell(&cell_id).await?,
        None => services.analysts.list().await?,
    };
    Ok(HttpResponse::Ok().json(analysts))
}

/// Create an analyst. Every referenced cell must exist.
#[utoipa::path(
    post,
    path = "/analysts",
    tag = "Analysts",
    request_body = NewAnalyst,
    responses(
        (status = 201, description = "Analyst created", body = Analyst),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown cell", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_analyst(
    services: web::Data<Services>,
    body: web::Json<NewAnalyst>,
) -> AppResult<HttpResponse> {
    let analyst = services.analysts.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(analyst))
}

/// Workload per analyst: assigned and in-progress projects, active hours.
#[utoipa::path(
    get,
    path = "/analysts/workload",
    tag = "Analysts",
    responses(
        (status = 200, description = "Workload of every analyst", body = Vec<AnalystWorkload>),
    )
)]
pub async fn get_workload(services: web::Data<Services>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.analysts.workload().await?))
}

#[utoipa::path(
    get,
    path = "/analysts/{id}",
    tag = "Analysts",
    params(("id" = String, Path, description = "Analyst id")),
    responses(
        (status = 200, description = "Analyst found", body = Analyst),
        (status = 404, description = "Analyst not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_analyst(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.analysts.get(&path).await?))
}

/// Projects an analyst is assigned to.
#[utoipa::path(
    get,
    path = "/analysts/{id}/projects",
    tag = "Analysts",
    params(("id" = String, Path, description = "Analyst id")),
    responses(
        (status = 200, description = "Assigned projects", body = Vec<Project>),
        (status = 404, description = "Analyst not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_analyst_projects(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.analysts.get(&path).await?;
    Ok(HttpResponse::Ok().json(services.projects.list_by_analyst(&path).await?))
}

#[utoipa::path(
    patch,
    path = "/analysts/{id}",
    tag = "Analysts",
    params(("id" = String, Path, description = "Analyst id")),
    request_body = AnalystUpdate,
    responses(
        (status = 200, description = "Analyst updated", body = Analyst),
        (status = 404, description = "Analyst not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown cell", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_analyst(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<AnalystUpdate>,
) -> AppResult<HttpResponse> {
    let analyst = services.analysts.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(analyst))
}

/// Delete an analyst and remove them from teams and projects.
#[utoipa::path(
    delete,
    path = "/analysts/{id}",
    tag = "Analysts",
    params(("id" = String, Path, description = "Analyst id")),
    responses(
        (status = 204, description = "Analyst deleted"),
        (status = 404, description = "Analyst not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_analyst(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.analysts.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure analyst routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/analysts")
            .route(web::get().to(list_analysts))
            .route(web::post().to(create_analyst)),
    )
    // Registered before `{id}` so "workload" is not taken as an id.
    .service(web::resource("/analysts/workload").route(web::get().to(get_workload)))
    .service(
        web::resource("/analysts/{id}")
            .route(web::get().to(get_analyst))
            .route(web::patch().to(update_analyst))
            .route(web::delete().to(delete_analyst)),
    )
    .service(web::resource("/analysts/{id}/projects").route(web::get().to(get_analyst_projects)));
}
