//! API endpoint modules.

pub mod analysts;
pub mod health;
pub mod incidents;
pub mod openapi;
pub mod projects;
pub mod reports;
pub mod teams;
pub mod test_cases;
pub mod test_plans;

use actix_web::web;

use crate::error::AppError;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Register every `/api/v1` route. Used by the server and the API tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(teams::configure_routes)
        .configure(analysts::configure_routes)
        .configure(projects::configure_routes)
        .configure(incidents::configure_routes)
        .configure(test_cases::configure_routes)
        .configure(test_plans::configure_routes)
        .configure(reports::configure_routes);
}

/// Malformed JSON bodies answer with the usual `INVALID_INPUT` error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}

/// Malformed query strings, e.g. an unknown `estado`, answer the same way.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}
