//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - One atomic statement per operation, no check-then-write
//! - Store "no rows" conditions become `NotFound` / `EditConflict`
//! - Every call runs under a caller-supplied `Deadline`
//! - No retries; every failure goes back to the caller

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use bookctl_core::{Book, Filters, Page, Version};

use super::deadline::Deadline;

pub mod books;

pub use books::BookRepo;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Transport or database failure; the cause is kept for logging.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Conditional update matched no row: the record was modified or
    /// deleted since the caller read it.
    #[error("edit conflict: {resource} '{id}' was modified concurrently")]
    EditConflict { resource: &'static str, id: String },

    /// The caller's deadline elapsed before the store answered.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl DbError {
    /// True for infrastructure failures, false for the expected
    /// `NotFound` / `EditConflict` outcomes.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Sqlx(_) | Self::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_edit_conflict(&self) -> bool {
        matches!(self, Self::EditConflict { .. })
    }
}

/// Book persistence capability.
///
/// Implemented once, against PostgreSQL, by [`BookRepo`].
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new book. The store assigns `id`, `created_at` and
    /// `version`; they are written back into `book`.
    async fn insert(&self, book: &mut Book, deadline: Deadline) -> Result<(), DbError>;

    /// Fetch one book. Ids below 1 are `NotFound` without a round trip.
    async fn get(&self, id: i64, deadline: Deadline) -> Result<Book, DbError>;

    /// Replace every mutable field if `book.version` is still current.
    ///
    /// On success the rotated version is written into `book` and returned.
    /// A missing row and a stale version both yield `EditConflict`.
    async fn update(&self, book: &mut Book, deadline: Deadline) -> Result<Version, DbError>;

    /// Hard-delete one book. Ids below 1, and ids with no row, are
    /// `NotFound`.
    async fn delete(&self, id: i64, deadline: Deadline) -> Result<(), DbError>;

    /// One page of books matching the title query and containing every
    /// genre in `genres`, with metadata for the whole result set.
    async fn search(
        &self,
        title: &str,
        content: &str,
        genres: &[String],
        filters: &Filters,
        deadline: Deadline,
    ) -> Result<Page<Book>, DbError>;
}

/// Every repository over one pool.
#[derive(Debug, Clone)]
pub struct Models {
    pub books: BookRepo,
}

impl Models {
    pub fn new(pool: PgPool) -> Self {
        Self {
            books: BookRepo::new(pool),
        }
    }

    /// Same as [`Models::new`] with a custom per-operation ceiling.
    pub fn with_timeout(pool: PgPool, timeout: Duration) -> Self {
        Self {
            books: BookRepo::with_timeout(pool, timeout),
        }
    }
}
