use core_types::CoreError;
use thiserror::Error;

/// The error taxonomy for every operation in this crate.
///
/// `sqlx` failures are classified once, in the `From` impl below, so callers
/// can match on intent (not connected, constraint, not found) instead of
/// inspecting driver errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("database is not connected: {0}")]
    NotConnected(String),

    #[error("could not obtain a connection from the pool: {0}")]
    AcquireConnection(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("the requested record was not found")]
    NotFound,

    #[error("storage constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("storage engine error: {0}")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => {
                DbError::NotConnected("the connection pool has been shut down".to_string())
            }
            sqlx::Error::PoolTimedOut => DbError::AcquireConnection(
                "timed out waiting for a pooled connection".to_string(),
            ),
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                DbError::ConstraintViolation(db.message().to_string())
            }
            other => DbError::Storage(other),
        }
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        DbError::Validation(err.to_string())
    }
}
