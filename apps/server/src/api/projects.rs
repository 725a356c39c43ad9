//! Project API handlers.
//!
//! Every project returned carries `effectiveStatus`, derived from its stored
//! status and dates as of today.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::models::{NewProject, Project, ProjectUpdate};
use crate::services::Services;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProjectQuery {
    /// Only projects this analyst is assigned to
    pub analyst_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Matching projects", body = Vec<Project>),
    )
)]
pub async fn list_projects(
    services: web::Data<Services>,
    query: web::Query<ProjectQuery>,
) -> AppResult<HttpResponse> {
    let projects = match query.into_inner().analyst_id {
        Some(analyst_id) => services.projects.list_by_analyst(&analyst_id).await?,
        None => services.projects.list().await?,
    };
    Ok(HttpResponse::Ok().json(projects))
}

/// Create a project. Assigned analysts must exist.
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = NewProject,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown analyst", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_project(
    services: web::Data<Services>,
    body: web::Json<NewProject>,
) -> AppResult<HttpResponse> {
    let project = services.projects.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_project(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.projects.get(&path).await?))
}

#[utoipa::path(
    patch,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown analyst", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_project(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<ProjectUpdate>,
) -> AppResult<HttpResponse> {
    let project = services.projects.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_project(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.projects.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure project routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects")
            .route(web::get().to(list_projects))
            .route(web::post().to(create_project)),
    )
    .service(
        web::resource("/projects/{id}")
            .route(web::get().to(get_project))
            .route(web::patch().to(update_project))
            .route(web::delete().to(delete_project)),
    );
}
