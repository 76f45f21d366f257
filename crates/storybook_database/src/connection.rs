//! Connection pooling and migrations.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use storybook_error::{DatabaseError, DatabaseErrorKind};

/// Pooled PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build a connection pool for `database_url`.
///
/// One connection is checked out and returned immediately so a bad URL
/// fails at startup instead of on the first request.
///
/// # Errors
///
/// Returns an error if the pool cannot be built or the database is unreachable.
#[tracing::instrument(skip(database_url))]
pub fn establish_pool(database_url: &str, pool_size: u32) -> Result<PgPool, DatabaseError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;

    {
        let _conn = pool
            .get()
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
    }

    tracing::info!(pool_size, "Database pool ready");
    Ok(pool)
}

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns an error if a connection cannot be obtained or a migration fails.
#[tracing::instrument(skip(pool))]
pub fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut conn = pool
        .get()
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;
    tracing::info!(count = applied.len(), "Applied pending migrations");
    Ok(())
}
