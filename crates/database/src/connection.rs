use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Establishes the bounded connection pool to PostgreSQL.
///
/// The pool keeps `min_connections` warm, grows on demand up to
/// `max_connections`, and queues acquisition beyond that for at most
/// `acquire_timeout_secs` before failing with an acquire error. Construction
/// itself opens an initial connection, so a wrong host or password fails here
/// rather than on the first query.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .min_connections(settings.min_connections)
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&settings.connect_url())
        .await
        .map_err(|e| DbError::NotConnected(e.to_string()))?;

    tracing::info!(
        host = %settings.host,
        port = settings.port,
        database = %settings.database,
        max_connections = settings.max_connections,
        "connected to PostgreSQL"
    );

    Ok(pool)
}

/// A utility function to run database migrations automatically.
///
/// This is useful for ensuring the database schema is up-to-date when the
/// application starts, which is especially important in production deployments.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
