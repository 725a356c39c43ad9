//! Per-entity backend selection with optional fallback to the file backend.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::EntityKind;

/// Which backend answered a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Database,
    File,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "postgres",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend policy for one entity type, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPolicy {
    pub use_database: bool,
    pub fallback_enabled: bool,
}

impl BackendPolicy {
    pub fn file_only() -> Self {
        Self {
            use_database: false,
            fallback_enabled: false,
        }
    }
}

/// Both backends for one entity type plus the policy choosing between them.
///
/// `S` is the entity's store trait object, e.g. `dyn AnalystStore`.
pub struct Backends<S: ?Sized> {
    entity: EntityKind,
    policy: BackendPolicy,
    database: Option<Arc<S>>,
    file: Arc<S>,
}

impl<S: ?Sized + Send + Sync> Backends<S> {
    /// Fails when the policy asks for the database but none was supplied.
    pub fn new(
        entity: EntityKind,
        policy: BackendPolicy,
        database: Option<Arc<S>>,
        file: Arc<S>,
    ) -> AppResult<Self> {
        if policy.use_database && database.is_none() {
            return Err(AppError::Configuration(format!(
                "{} is configured for PostgreSQL but no database connection is available",
                entity
            )));
        }
        Ok(Self {
            entity,
            policy,
            database,
            file,
        })
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn policy(&self) -> BackendPolicy {
        self.policy
    }

    /// Backend that calls go to first.
    pub fn active(&self) -> StoreKind {
        if self.policy.use_database {
            StoreKind::Database
        } else {
            StoreKind::File
        }
    }

    /// Run `call` against the active backend.
    ///
    /// A backend failure from the database is retried once against the file
    /// backend when fallback is enabled. Every other error is returned as is.
    pub async fn run<'a, T, F>(&'a self, op: &'static str, call: F) -> AppResult<T>
    where
        F: Fn(&'a S) -> BoxFuture<'a, AppResult<T>>,
    {
        let database = match (&self.database, self.policy.use_database) {
            (Some(database), true) => database,
            _ => return call(&*self.file).await,
        };

        match call(&**database).await {
            Ok(value) => Ok(value),
            Err(err) if self.policy.fallback_enabled && err.is_backend_failure() => {
                warn!(
                    entity = %self.entity,
                    op,
                    error = %err,
                    "PostgreSQL call failed, falling back to file storage"
                );
                call(&*self.file).await
            }
            Err(err) => Err(err),
        }
    }
}
