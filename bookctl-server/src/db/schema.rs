//! Bootstrap for the `books` relation the repository reads and writes

use sqlx::PgPool;

use super::repos::DbError;

/// Create the `books` table and its title search index if missing.
///
/// Idempotent. `gen_random_uuid()` is built in from PostgreSQL 13.
pub async fn ensure(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Ensuring books schema...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id BIGSERIAL PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            year INTEGER NOT NULL,
            pages INTEGER NOT NULL,
            genres TEXT[] NOT NULL,
            version UUID NOT NULL DEFAULT gen_random_uuid()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS books_title_idx
        ON books USING GIN (to_tsvector('simple', title))
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS books_genres_idx ON books USING GIN (genres)")
        .execute(pool)
        .await?;

    tracing::info!("Books schema ready");
    Ok(())
}
