//! Business logic services.
//!
//! The facades below are the only callers of the storage backends. They
//! assign ids, validate input, keep references between entity types
//! consistent and fill in derived fields.

pub mod analysts;
pub mod export;
pub mod import;
pub mod incident_id;
pub mod incidents;
pub mod projects;
pub mod quality;
pub mod teams;
pub mod test_cases;
pub mod test_plans;
pub mod verification;

use std::sync::Arc;

use crate::config::StorageSettings;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::file_store::FileStore;
use crate::models::EntityKind;
use crate::store::{
    AnalystStore, BackendPolicy, Backends, CellStore, IncidentStore, ProjectStore, TeamStore,
    TestCaseStore, TestPlanStore,
};

pub use analysts::AnalystService;
pub use incidents::IncidentService;
pub use projects::ProjectService;
pub use quality::{QualityBreakdown, QualityScope};
pub use teams::{CellService, TeamService};
pub use test_cases::TestCaseService;
pub use test_plans::TestPlanService;

/// Backend selection for every entity type.
#[derive(Clone)]
pub struct Stores {
    pub teams: Arc<Backends<dyn TeamStore>>,
    pub cells: Arc<Backends<dyn CellStore>>,
    pub analysts: Arc<Backends<dyn AnalystStore>>,
    pub projects: Arc<Backends<dyn ProjectStore>>,
    pub incidents: Arc<Backends<dyn IncidentStore>>,
    pub test_plans: Arc<Backends<dyn TestPlanStore>>,
    pub test_cases: Arc<Backends<dyn TestCaseStore>>,
}

fn backends<S: ?Sized + Send + Sync>(
    kind: EntityKind,
    settings: &StorageSettings,
    database: Option<Arc<S>>,
    file: Arc<S>,
) -> AppResult<Arc<Backends<S>>> {
    let policy = BackendPolicy {
        use_database: settings.use_postgres(kind),
        fallback_enabled: settings.fallback_enabled,
    };
    Ok(Arc::new(Backends::new(kind, policy, database, file)?))
}

impl Stores {
    /// Fails if an entity type is configured for PostgreSQL and `database`
    /// is `None`.
    pub fn new(
        settings: &StorageSettings,
        database: Option<Arc<DbPool>>,
        file: Arc<FileStore>,
    ) -> AppResult<Self> {
        Ok(Self {
            teams: backends::<dyn TeamStore>(
                EntityKind::Teams,
                settings,
                database.clone().map(|db| db as Arc<dyn TeamStore>),
                file.clone(),
            )?,
            cells: backends::<dyn CellStore>(
                EntityKind::Cells,
                settings,
                database.clone().map(|db| db as Arc<dyn CellStore>),
                file.clone(),
            )?,
            analysts: backends::<dyn AnalystStore>(
                EntityKind::Analysts,
                settings,
                database.clone().map(|db| db as Arc<dyn AnalystStore>),
                file.clone(),
            )?,
            projects: backends::<dyn ProjectStore>(
                EntityKind::Projects,
                settings,
                database.clone().map(|db| db as Arc<dyn ProjectStore>),
                file.clone(),
            )?,
            incidents: backends::<dyn IncidentStore>(
                EntityKind::Incidents,
                settings,
                database.clone().map(|db| db as Arc<dyn IncidentStore>),
                file.clone(),
            )?,
            test_plans: backends::<dyn TestPlanStore>(
                EntityKind::TestPlans,
                settings,
                database.clone().map(|db| db as Arc<dyn TestPlanStore>),
                file.clone(),
            )?,
            test_cases: backends::<dyn TestCaseStore>(
                EntityKind::TestCases,
                settings,
                database.map(|db| db as Arc<dyn TestCaseStore>),
                file,
            )?,
        })
    }
}

/// All facades, shared by the HTTP handlers and the command-line tools.
#[derive(Clone)]
pub struct Services {
    pub teams: TeamService,
    pub cells: CellService,
    pub analysts: AnalystService,
    pub projects: ProjectService,
    pub incidents: IncidentService,
    pub test_plans: TestPlanService,
    pub test_cases: TestCaseService,
}

impl Services {
    pub fn new(
        settings: &StorageSettings,
        database: Option<Arc<DbPool>>,
        file: Arc<FileStore>,
    ) -> AppResult<Self> {
        Ok(Self::from_stores(Stores::new(settings, database, file)?))
    }

    pub fn from_stores(stores: Stores) -> Self {
        Self {
            teams: TeamService::new(stores.clone()),
            cells: CellService::new(stores.clone()),
            analysts: AnalystService::new(stores.clone()),
            projects: ProjectService::new(stores.clone()),
            incidents: IncidentService::new(stores.clone()),
            test_plans: TestPlanService::new(stores.clone()),
            test_cases: TestCaseService::new(stores),
        }
    }

    /// File backend only, rooted at `data_dir`.
    pub fn file_only(data_dir: impl Into<std::path::PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        let settings = StorageSettings::file_only(data_dir.clone());
        Self::new(&settings, None, Arc::new(FileStore::new(data_dir)))
    }

    /// Quality over every test case matching `scope`.
    pub async fn quality(&self, scope: &QualityScope) -> AppResult<QualityBreakdown> {
        let cases = self.test_cases.list_matching(scope).await?;
        Ok(quality::score_test_cases(&cases))
    }
}

pub(crate) fn not_found(what: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} '{}'", what, id))
}
