//! PostgreSQL backend: connection management, migrations, and the store
//! trait implementations.

pub mod analysts;
pub mod incidents;
pub mod projects;
pub mod teams;
pub mod test_cases;
pub mod test_plans;

use std::time::Duration;

use sea_orm::sqlx::error::DatabaseError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, RuntimeErr};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Pooled PostgreSQL connection.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect using the configured URL and bring the schema up to date.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let mut options = ConnectOptions::new(config.database_url.clone());
        options
            .max_connections(config.db_max_connections)
            .connect_timeout(Duration::from_secs(5))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Migrator::up(&conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations complete");

        Ok(Self { conn })
    }

    /// Wrap an existing connection without running migrations.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Cheap liveness check used by the readiness probe.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }
}

/// Map a driver error to an [`AppError`] with context.
pub(crate) fn db_error(action: &'static str) -> impl FnOnce(DbErr) -> AppError {
    move |e| classify_db_error(action, e)
}

/// Only connectivity and query failures become `Database` (and so trigger
/// fallback). Rows rejected by a constraint are the caller's problem.
pub(crate) fn classify_db_error(action: &str, err: DbErr) -> AppError {
    let code = sqlstate(&err);
    match ConstraintClass::of(code.as_deref()) {
        Some(class) => {
            warn!(action, sqlstate = ?code, error = %err, "Row rejected by database constraint");
            class.into_error(action)
        }
        None => AppError::Database(format!("Failed to {}: {}", action, err)),
    }
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(DatabaseError::code)
            .map(|code| code.into_owned()),
        _ => None,
    }
}

/// PostgreSQL integrity errors (SQLSTATE class 23).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintClass {
    /// unique_violation, foreign_key_violation, exclusion_violation
    Conflict,
    /// not_null_violation, check_violation and the rest of the class
    Rejected,
}

impl ConstraintClass {
    fn of(sqlstate: Option<&str>) -> Option<Self> {
        match sqlstate? {
            "23505" | "23503" | "23P01" => Some(Self::Conflict),
            code if code.starts_with("23") => Some(Self::Rejected),
            _ => None,
        }
    }

    fn into_error(self, action: &str) -> AppError {
        match self {
            Self::Conflict => AppError::ConstraintViolation(format!(
                "Failed to {}: conflicts with an existing record",
                action
            )),
            Self::Rejected => AppError::InvalidInput(format!(
                "Failed to {}: value rejected by the database",
                action
            )),
        }
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T, column: &str) -> AppResult<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Database(format!("Failed to encode {}: {}", column, e)))
}

pub(crate) fn from_json<T: DeserializeOwned>(value: JsonValue, column: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Database(format!("Invalid {} column: {}", column, e)))
}

/// Decode an enum stored as its `as_str` code.
pub(crate) fn parse_code<T>(value: &str, column: &str, parse: fn(&str) -> Option<T>) -> AppResult<T> {
    parse(value).ok_or_else(|| AppError::Database(format!("Unknown {} '{}'", column, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_errors_are_not_backend_failures() {
        assert_eq!(ConstraintClass::of(Some("23505")), Some(ConstraintClass::Conflict));
        assert_eq!(ConstraintClass::of(Some("23503")), Some(ConstraintClass::Conflict));
        assert_eq!(ConstraintClass::of(Some("23514")), Some(ConstraintClass::Rejected));
        assert_eq!(ConstraintClass::of(Some("23502")), Some(ConstraintClass::Rejected));

        let conflict = ConstraintClass::Conflict.into_error("insert team");
        assert!(matches!(conflict, AppError::ConstraintViolation(_)));
        assert!(!conflict.is_backend_failure());
        let rejected = ConstraintClass::Rejected.into_error("insert cell");
        assert!(matches!(rejected, AppError::InvalidInput(_)));
        assert!(!rejected.is_backend_failure());
    }

    #[test]
    fn test_connection_errors_still_fall_back() {
        // 08006: connection_failure, 57P01: admin_shutdown
        assert_eq!(ConstraintClass::of(Some("08006")), None);
        assert_eq!(ConstraintClass::of(Some("57P01")), None);
        assert_eq!(ConstraintClass::of(None), None);

        let err = classify_db_error(
            "list teams",
            DbErr::Conn(RuntimeErr::Internal("connection refused".to_string())),
        );
        assert!(err.is_backend_failure());
        let err = db_error("get team")(DbErr::Custom("buffer is empty".to_string()));
        assert!(err.is_backend_failure());
    }
}
