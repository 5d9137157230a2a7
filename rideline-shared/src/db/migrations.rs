/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root.
/// Each migration is reversible and consists of two files:
/// - `{version}_{name}.up.sql`
/// - `{version}_{name}.down.sql`
///
/// # Example
///
/// ```no_run
/// use rideline_shared::db::pool::{create_pool, DatabaseConfig};
/// use rideline_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///
///     Ok(())
/// }
/// ```

use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{info, warn};

/// Creates the database named in the URL if it does not exist yet
///
/// Useful for local development and test setups; production databases are
/// provisioned out of band.
///
/// # Errors
///
/// Returns an error if the server is unreachable or the database cannot be
/// created
pub async fn ensure_database_exists(url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(url).await?;
    }
    Ok(())
}

/// Runs all pending database migrations
///
/// Migrations that have already been applied are skipped. A failing migration
/// is rolled back and the error is returned.
///
/// # Errors
///
/// Returns an error if:
/// - A migration file is malformed
/// - A migration fails to execute
/// - Database connection is lost during migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
