//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "QA Manager Server",
        version = "0.3.0",
        description = "API server for QA analysts, teams, incidents, projects, test cases and test plans, stored in JSON files or PostgreSQL"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Teams and cells
        api::teams::list_teams,
        api::teams::create_team,
        api::teams::get_team,
        api::teams::update_team,
        api::teams::delete_team,
        api::teams::list_cells,
        api::teams::create_cell,
        api::teams::get_cell,
        api::teams::update_cell,
        api::teams::delete_cell,
        // Analysts
        api::analysts::list_analysts,
        api::analysts::create_analyst,
        api::analysts::get_workload,
        api::analysts::get_analyst,
        api::analysts::get_analyst_projects,
        api::analysts::update_analyst,
        api::analysts::delete_analyst,
        // Projects
        api::projects::list_projects,
        api::projects::create_project,
        api::projects::get_project,
        api::projects::update_project,
        api::projects::delete_project,
        // Incidents
        api::incidents::list_incidents,
        api::incidents::create_incident,
        api::incidents::get_stats,
        api::incidents::get_incident,
        api::incidents::update_incident,
        api::incidents::delete_incident,
        // Test cases
        api::test_cases::list_test_cases,
        api::test_cases::create_test_case,
        api::test_cases::get_test_case,
        api::test_cases::update_test_case,
        api::test_cases::delete_test_case,
        api::test_cases::add_evidence,
        // Test plans
        api::test_plans::list_test_plans,
        api::test_plans::create_test_plan,
        api::test_plans::get_test_plan,
        api::test_plans::update_test_plan,
        api::test_plans::delete_test_plan,
        api::test_plans::get_test_plan_quality,
        api::test_plans::recompute_test_plan,
        // Quality and exports
        api::reports::get_quality,
        api::reports::export_incidents,
        api::reports::export_test_plan,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Teams
            models::Team,
            models::NewTeam,
            models::TeamUpdate,
            models::Cell,
            models::NewCell,
            models::CellUpdate,
            // Analysts
            models::AnalystRole,
            models::Analyst,
            models::NewAnalyst,
            models::AnalystUpdate,
            models::AnalystWorkload,
            // Projects
            models::ProjectStatus,
            models::Project,
            models::NewProject,
            models::ProjectUpdate,
            // Incidents
            models::IncidentState,
            models::Priority,
            models::StateChange,
            models::Incident,
            models::NewIncident,
            models::IncidentUpdate,
            models::IncidentStats,
            models::PriorityCounts,
            // Test cases
            models::TestCaseStatus,
            models::Evidence,
            models::NewEvidence,
            models::TestCase,
            models::NewTestCase,
            models::TestCaseUpdate,
            // Test plans
            models::Cycle,
            models::TestPlan,
            models::NewTestPlan,
            models::TestPlanUpdate,
            services::QualityBreakdown,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Teams", description = "Teams"),
        (name = "Cells", description = "Cells within teams"),
        (name = "Analysts", description = "QA analysts and their workload"),
        (name = "Projects", description = "Projects and analyst assignments"),
        (name = "Incidents", description = "Incident tracking and statistics"),
        (name = "Test Cases", description = "Test cases and execution evidence"),
        (name = "Test Plans", description = "Test plans, cycles and quality"),
        (name = "Quality", description = "Quality score over filtered test cases"),
        (name = "Exports", description = "CSV exports")
    )
)]
pub struct ApiDoc;
