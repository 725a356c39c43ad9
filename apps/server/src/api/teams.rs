//! Team and cell API handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::models::{Cell, CellUpdate, NewCell, NewTeam, Team, TeamUpdate};
use crate::services::Services;

/// Query parameters for listing cells.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CellQuery {
    /// Only cells belonging to this team
    pub team_id: Option<String>,
}

/// List all teams.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "Teams",
    responses(
        (status = 200, description = "All teams", body = Vec<Team>),
    )
)]
pub async fn list_teams(services: web::Data<Services>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.teams.list().await?))
}

/// Create a team.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "Teams",
    request_body = NewTeam,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_team(
    services: web::Data<Services>,
    body: web::Json<NewTeam>,
) -> AppResult<HttpResponse> {
    let team = services.teams.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(team))
}

/// Get a team by id.
#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team found", body = Team),
        (status = 404, description = "Team not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_team(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.teams.get(&path).await?))
}

/// Partially update a team.
#[utoipa::path(
    patch,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = String, Path, description = "Team id")),
    request_body = TeamUpdate,
    responses(
        (status = 200, description = "Team updated", body = Team),
        (status = 404, description = "Team not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_team(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<TeamUpdate>,
) -> AppResult<HttpResponse> {
    let team = services.teams.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(team))
}

/// Delete a team. Refused while cells still belong to it.
#[utoipa::path(
    delete,
    path = "/teams/{id}",
    tag = "Teams",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 404, description = "Team not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Team still has cells", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_team(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.teams.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List cells, optionally for one team.
#[utoipa::path(
    get,
    path = "/cells",
    tag = "Cells",
    params(CellQuery),
    responses(
        (status = 200, description = "Matching cells", body = Vec<Cell>),
    )
)]
pub async fn list_cells(
    services: web::Data<Services>,
    query: web::Query<CellQuery>,
) -> AppResult<HttpResponse> {
    let cells = match query.into_inner().team_id {
        Some(team_id) => services.cells.list_by_team(&team_id).await?,
        None => services.cells.list().await?,
    };
    Ok(HttpResponse::Ok().json(cells))
}

/// Create a cell inside an existing team.
#[utoipa::path(
    post,
    path = "/cells",
    tag = "Cells",
    request_body = NewCell,
    responses(
        (status = 201, description = "Cell created", body = Cell),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Team does not exist", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_cell(
    services: web::Data<Services>,
    body: web::Json<NewCell>,
) -> AppResult<HttpResponse> {
    let cell = services.cells.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(cell))
}

/// Get a cell by id.
#[utoipa::path(
    get,
    path = "/cells/{id}",
    tag = "Cells",
    params(("id" = String, Path, description = "Cell id")),
    responses(
        (status = 200, description = "Cell found", body = Cell),
        (status = 404, description = "Cell not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_cell(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.cells.get(&path).await?))
}

/// Partially update a cell.
#[utoipa::path(
    patch,
    path = "/cells/{id}",
    tag = "Cells",
    params(("id" = String, Path, description = "Cell id")),
    request_body = CellUpdate,
    responses(
        (status = 200, description = "Cell updated", body = Cell),
        (status = 404, description = "Cell not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Team does not exist", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_cell(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<CellUpdate>,
) -> AppResult<HttpResponse> {
    let cell = services.cells.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cell))
}

/// Delete a cell and drop it from every analyst.
#[utoipa::path(
    delete,
    path = "/cells/{id}",
    tag = "Cells",
    params(("id" = String, Path, description = "Cell id")),
    responses(
        (status = 204, description = "Cell deleted"),
        (status = 404, description = "Cell not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_cell(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.cells.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure team and cell routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/teams")
            .route(web::get().to(list_teams))
            .route(web::post().to(create_team)),
    )
    .service(
        web::resource("/teams/{id}")
            .route(web::get().to(get_team))
            .route(web::patch().to(update_team))
            .route(web::delete().to(delete_team)),
    )
    .service(
        web::resource("/cells")
            .route(web::get().to(list_cells))
            .route(web::post().to(create_cell)),
    )
    .service(
        web::resource("/cells/{id}")
            .route(web::get().to(get_cell))
            .route(web::patch().to(update_cell))
            .route(web::delete().to(delete_cell)),
    );
}
