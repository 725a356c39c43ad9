//! Incident API handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::models::{Incident, IncidentState, IncidentStats, IncidentUpdate, NewIncident};
use crate::services::Services;

/// Query parameters for listing incidents.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IncidentQuery {
    /// Only incidents in this state, e.g. `Abierto`
    #[serde(rename = "estado")]
    pub state: Option<IncidentState>,
}

/// List incidents, optionally filtered by state.
#[utoipa::path(
    get,
    path = "/incidents",
    tag = "Incidents",
    params(IncidentQuery),
    responses(
        (status = 200, description = "Matching incidents", body = Vec<Incident>),
        (status = 400, description = "Unknown state", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_incidents(
    services: web::Data<Services>,
    query: web::Query<IncidentQuery>,
) -> AppResult<HttpResponse> {
    let incidents = services.incidents.list(query.into_inner().state).await?;
    Ok(HttpResponse::Ok().json(incidents))
}

/// Report an incident.
///
/// The id (`INC-YYYYMMDD-NNN`) is assigned by the server.
#[utoipa::path(
    post,
    path = "/incidents",
    tag = "Incidents",
    request_body = NewIncident,
    responses(
        (status = 201, description = "Incident created", body = Incident),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_incident(
    services: web::Data<Services>,
    body: web::Json<NewIncident>,
) -> AppResult<HttpResponse> {
    let incident = services.incidents.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(incident))
}

/// Counts by state and by priority, plus mean days to resolve.
#[utoipa::path(
    get,
    path = "/incidents/stats",
    tag = "Incidents",
    responses(
        (status = 200, description = "Incident statistics", body = IncidentStats),
    )
)]
pub async fn get_stats(services: web::Data<Services>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.incidents.stats().await?))
}

#[utoipa::path(
    get,
    path = "/incidents/{id}",
    tag = "Incidents",
    params(("id" = String, Path, description = "Incident id")),
    responses(
        (status = 200, description = "Incident found", body = Incident),
        (status = 404, description = "Incident not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_incident(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(services.incidents.get(&path).await?))
}

/// Partially update an incident.
///
/// A state change is appended to the history; moving to `Resuelto` stamps the
/// resolution date and leaving it clears the date.
#[utoipa::path(
    patch,
    path = "/incidents/{id}",
    tag = "Incidents",
    params(("id" = String, Path, description = "Incident id")),
    request_body = IncidentUpdate,
    responses(
        (status = 200, description = "Incident updated", body = Incident),
        (status = 404, description = "Incident not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_incident(
    services: web::Data<Services>,
    path: web::Path<String>,
    body: web::Json<IncidentUpdate>,
) -> AppResult<HttpResponse> {
    let incident = services.incidents.update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(incident))
}

#[utoipa::path(
    delete,
    path = "/incidents/{id}",
    tag = "Incidents",
    params(("id" = String, Path, description = "Incident id")),
    responses(
        (status = 204, description = "Incident deleted"),
        (status = 404, description = "Incident not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_incident(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    services.incidents.delete(&path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure incident routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/incidents")
            .route(web::get().to(list_incidents))
            .route(web::post().to(create_incident)),
    )
    .service(web::resource("/incidents/stats").route(web::get().to(get_stats)))
    .service(
        web::resource("/incidents/{id}")
            .route(web::get().to(get_incident))
            .route(web::patch().to(update_incident))
            .route(web::delete().to(delete_incident)),
    );
}
