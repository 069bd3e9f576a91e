//! Book repository
//!
//! Optimistic concurrency: `version` is regenerated by the store on every
//! update and the update is conditional on the caller's version, so of two
//! updates racing from the same version exactly one commits.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use bookctl_core::{calculate_metadata, Book, Filters, Page, Pages, Version};

use super::{BookStore, DbError};
use crate::db::deadline::{Deadline, STORE_TIMEOUT};
use crate::db::query::{search_sql, BOOK_COLUMNS};

const RESOURCE: &str = "book";

/// Book repository
#[derive(Debug, Clone)]
pub struct BookRepo {
    pool: PgPool,
    timeout: Duration,
}

impl BookRepo {
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, STORE_TIMEOUT)
    }

    /// Repository whose operations never run longer than `timeout`, even
    /// when the caller's deadline is later.
    pub fn with_timeout(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn not_found(id: i64) -> DbError {
        DbError::NotFound {
            resource: RESOURCE,
            id: id.to_string(),
        }
    }
}

/// Scan a full book row.
fn book_from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        year: row.try_get("year")?,
        pages: Pages::new(row.try_get("pages")?),
        genres: row.try_get("genres")?,
        version: Version::from_uuid(row.try_get("version")?),
    })
}

#[async_trait]
impl BookStore for BookRepo {
    async fn insert(&self, book: &mut Book, deadline: Deadline) -> Result<(), DbError> {
        let row = deadline
            .capped(self.timeout)
            .run("books.insert", async {
                let row = sqlx::query(
                    r#"
                    INSERT INTO books (title, content, year, pages, genres)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, created_at, version
                    "#,
                )
                .bind(&book.title)
                .bind(&book.content)
                .bind(book.year)
                .bind(book.pages.get())
                .bind(&book.genres)
                .fetch_one(&self.pool)
                .await?;
                Ok::<_, DbError>(row)
            })
            .await?;

        book.id = row.try_get("id")?;
        book.created_at = row.try_get("created_at")?;
        book.version = Version::from_uuid(row.try_get("version")?);

        tracing::debug!(book_id = book.id, version = %book.version, "book inserted");
        Ok(())
    }

    async fn get(&self, id: i64, deadline: Deadline) -> Result<Book, DbError> {
        if id < 1 {
            return Err(Self::not_found(id));
        }

        let row = deadline
            .capped(self.timeout)
            .run("books.get", async {
                let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok::<_, DbError>(row)
            })
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        Ok(book_from_row(&row)?)
    }

    async fn update(&self, book: &mut Book, deadline: Deadline) -> Result<Version, DbError> {
        let current = book.version;

        let row = deadline
            .capped(self.timeout)
            .run("books.update", async {
                let row = sqlx::query(
                    r#"
                    UPDATE books
                    SET title = $1, content = $2, year = $3, pages = $4, genres = $5,
                        version = gen_random_uuid()
                    WHERE id = $6 AND version = $7
                    RETURNING version
                    "#,
                )
                .bind(&book.title)
                .bind(&book.content)
                .bind(book.year)
                .bind(book.pages.get())
                .bind(&book.genres)
                .bind(book.id)
                .bind(current.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
                Ok::<_, DbError>(row)
            })
            .await?;

        // Zero rows: gone or stale. Telling them apart would need a second read.
        let Some(row) = row else {
            tracing::warn!(book_id = book.id, version = %current, "edit conflict");
            return Err(DbError::EditConflict {
                resource: RESOURCE,
                id: book.id.to_string(),
            });
        };

        let next: Uuid = row.try_get("version")?;
        book.version = Version::from_uuid(next);

        tracing::debug!(book_id = book.id, version = %book.version, "book updated");
        Ok(book.version)
    }

    async fn delete(&self, id: i64, deadline: Deadline) -> Result<(), DbError> {
        if id < 1 {
            return Err(Self::not_found(id));
        }

        let result = deadline
            .capped(self.timeout)
            .run("books.delete", async {
                let result = sqlx::query("DELETE FROM books WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                Ok::<_, DbError>(result)
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }

        tracing::debug!(book_id = id, "book deleted");
        Ok(())
    }

    /// `content` is accepted for call-surface compatibility but does not
    /// narrow the results; only the title query and genres do.
    async fn search(
        &self,
        title: &str,
        content: &str,
        genres: &[String],
        filters: &Filters,
        deadline: Deadline,
    ) -> Result<Page<Book>, DbError> {
        let sql = search_sql(filters);

        let rows = deadline
            .capped(self.timeout)
            .run("books.search", async {
                let rows = sqlx::query(&sql)
                    .bind(title)
                    .bind(genres)
                    .bind(filters.limit())
                    .bind(filters.offset())
                    .fetch_all(&self.pool)
                    .await?;
                Ok::<_, DbError>(rows)
            })
            .await?;

        let total: i64 = match rows.first() {
            Some(row) => row.try_get("total_records")?,
            None => 0,
        };
        let items = rows
            .iter()
            .map(book_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            title_query = title,
            content_query = content,
            genres = ?genres,
            sort = %filters.sort(),
            page = filters.page(),
            returned = items.len(),
            total,
            "book search"
        );

        Ok(Page {
            items,
            metadata: calculate_metadata(total, filters.page(), filters.page_size()),
        })
    }
}
