//! Database connection pool management
//!
//! Uses sqlx PgPool with an explicit connection cap and idle reaper.
//! Liveness is checked once, at startup, with a bounded ping.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};

use super::deadline::Deadline;
use super::repos::DbError;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;

/// Default time an unused connection is kept before the reaper closes it.
pub const DEFAULT_MAX_IDLE_TIME: Duration = Duration::from_secs(15 * 60);

/// Ceiling on the startup ping.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Hard cap on live connections
    pub max_connections: u32,
    /// Idle connections older than this are closed
    pub max_idle_time: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_idle_time: DEFAULT_MAX_IDLE_TIME,
        }
    }
}

/// Create a PostgreSQL connection pool with default options.
///
/// # Errors
///
/// Returns an error if the DSN is malformed or the startup ping fails
/// within [`PING_TIMEOUT`].
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/bookctl").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, DbError> {
    create_pool_with_options(database_url, PoolOptions::default()).await
}

/// Create a PostgreSQL connection pool with custom options, then ping it.
pub async fn create_pool_with_options(
    database_url: &str,
    options: PoolOptions,
) -> Result<PgPool, DbError> {
    let connect: PgConnectOptions = database_url.parse()?;

    let pool = PgPoolOptions::new()
        .max_connections(options.max_connections)
        .idle_timeout(Some(options.max_idle_time))
        .connect_lazy_with(connect);

    ping(&pool, Deadline::after(PING_TIMEOUT)).await?;

    tracing::info!(
        max_connections = options.max_connections,
        max_idle_secs = options.max_idle_time.as_secs(),
        "database connection pool established"
    );
    Ok(pool)
}

/// Acquire one connection and round-trip a ping before `deadline`.
pub async fn ping(pool: &PgPool, deadline: Deadline) -> Result<(), DbError> {
    deadline
        .run("ping", async {
            let mut conn = pool.acquire().await?;
            conn.ping().await?;
            Ok::<(), DbError>(())
        })
        .await
}
