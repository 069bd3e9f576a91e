//! SQL text for book search
//!
//! Search terms are always bound parameters. The sort column and
//! direction cannot be bound, so they are interpolated, and they come only
//! from a validated `Filters` whose sort is a closed enum.

use bookctl_core::Filters;

/// Columns selected for a full book row, in scan order.
pub const BOOK_COLUMNS: &str = "id, created_at, title, content, year, pages, genres, version";

/// Build the search statement for `filters`.
///
/// Bind order: `$1` title query, `$2` genre filter (`text[]`), `$3` LIMIT,
/// `$4` OFFSET. Every row carries `total_records`, the windowed count of
/// all matching rows ignoring LIMIT/OFFSET.
pub fn search_sql(filters: &Filters) -> String {
    format!(
        r#"
        SELECT count(*) OVER() AS total_records, {columns}
        FROM books
        WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
        AND (genres @> $2 OR $2 = '{{}}')
        ORDER BY {column} {direction}, id ASC
        LIMIT $3 OFFSET $4
        "#,
        columns = BOOK_COLUMNS,
        column = filters.sort_column(),
        direction = filters.sort_direction(),
    )
}
