//! Book endpoints
//!
//! Every handler takes one deadline from the app state and passes it to
//! each store call it makes, so a PATCH (read then write) shares a budget.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use bookctl_core::models::{ValidationError, Validator};
use bookctl_core::{Book, Filters, Metadata, Pages, Version};

use crate::db::BookStore;
use crate::http::error::ApiError;
use crate::http::extractors::{BookId, ValidJson};
use crate::http::server::AppState;

/// Header carrying the version a PATCH was based on.
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

/// Create book request
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub pages: Pages,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Partial update request; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub year: Option<i32>,
    pub pages: Option<Pages>,
    pub genres: Option<Vec<String>>,
}

impl UpdateBookRequest {
    fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(content) = self.content {
            book.content = content;
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
        if let Some(genres) = self.genres {
            book.genres = genres;
        }
    }
}

/// Raw list query; numbers stay text so a bad value is a field error.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub genres: String,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

impl ListBooksQuery {
    /// Comma-separated genres, blanks dropped.
    fn genre_list(&self) -> Vec<String> {
        self.genres
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(String::from)
            .collect()
    }

    fn filters(&self) -> Result<Filters, ApiError> {
        let defaults = Filters::default();
        let mut v = Validator::new();

        let page = read_int(&mut v, "page", self.page.as_deref(), defaults.page());
        let page_size = read_int(
            &mut v,
            "page_size",
            self.page_size.as_deref(),
            defaults.page_size(),
        );
        v.finish()?;

        let sort = self
            .sort
            .clone()
            .unwrap_or_else(|| defaults.sort().to_string());
        Ok(Filters::new(page, page_size, &sort)?)
    }
}

fn read_int(v: &mut Validator, field: &'static str, raw: Option<&str>, default: u32) -> u32 {
    match raw {
        None | Some("") => default,
        // Negative input parses as i64 so it reaches the range rules.
        Some(s) => match s.parse::<i64>() {
            Ok(n) => u32::try_from(n.max(0)).unwrap_or(u32::MAX),
            Err(_) => {
                v.add(ValidationError::OutOfRange {
                    field,
                    reason: "must be an integer value".to_string(),
                });
                default
            }
        },
    }
}

/// Single book envelope
#[derive(Serialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// List envelope
#[derive(Serialize)]
pub struct BooksEnvelope {
    pub books: Vec<Book>,
    pub metadata: Metadata,
}

/// Message envelope
#[derive(Serialize)]
pub struct MessageEnvelope {
    pub message: &'static str,
}

/// POST /v1/books - create a book
async fn create_book(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut book = Book::new(req.title, req.content, req.year, req.pages, req.genres);
    book.validate()?;

    state.models.books.insert(&mut book, state.deadline()).await?;

    tracing::info!(book_id = book.id, "book created");
    let location = format!("/v1/books/{}", book.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(BookEnvelope { book }),
    ))
}

/// GET /v1/books/{id} - fetch one book
async fn show_book(
    State(state): State<Arc<AppState>>,
    BookId(id): BookId,
) -> Result<Json<BookEnvelope>, ApiError> {
    let book = state.models.books.get(id, state.deadline()).await?;
    Ok(Json(BookEnvelope { book }))
}

/// PATCH /v1/books/{id} - partial update under optimistic concurrency
async fn update_book(
    State(state): State<Arc<AppState>>,
    BookId(id): BookId,
    headers: HeaderMap,
    ValidJson(req): ValidJson<UpdateBookRequest>,
) -> Result<Json<BookEnvelope>, ApiError> {
    let expected = expected_version(&headers)?;
    let deadline = state.deadline();

    let mut book = state.models.books.get(id, deadline).await?;

    if let Some(expected) = expected {
        if expected != book.version {
            tracing::info!(
                book_id = id,
                expected = %expected,
                current = %book.version,
                "stale expected version"
            );
            return Err(ApiError::EditConflict {
                resource: "book",
                id: id.to_string(),
            });
        }
    }

    req.apply(&mut book);
    book.validate()?;

    state.models.books.update(&mut book, deadline).await?;
    Ok(Json(BookEnvelope { book }))
}

fn expected_version(headers: &HeaderMap) -> Result<Option<Version>, ApiError> {
    let Some(raw) = headers.get(EXPECTED_VERSION_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse::<Version>().ok())
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest {
            message: format!("{} header must be a version UUID", EXPECTED_VERSION_HEADER),
        })
}

/// DELETE /v1/books/{id} - remove a book
async fn delete_book(
    State(state): State<Arc<AppState>>,
    BookId(id): BookId,
) -> Result<Json<MessageEnvelope>, ApiError> {
    state.models.books.delete(id, state.deadline()).await?;
    Ok(Json(MessageEnvelope {
        message: "book successfully deleted",
    }))
}

/// GET /v1/books - search with pagination
async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<BooksEnvelope>, ApiError> {
    let filters = query.filters()?;
    let genres = query.genre_list();

    let page = state
        .models
        .books
        .search(&query.title, &query.content, &genres, &filters, state.deadline())
        .await?;

    Ok(Json(BooksEnvelope {
        books: page.items,
        metadata: page.metadata,
    }))
}

/// Book routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/books", get(list_books).post(create_book))
        .route(
            "/v1/books/{id}",
            get(show_book).patch(update_book).delete(delete_book),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>, sort: Option<&str>) -> ListBooksQuery {
        ListBooksQuery {
            page: page.map(String::from),
            page_size: page_size.map(String::from),
            sort: sort.map(String::from),
            ..ListBooksQuery::default()
        }
    }

    #[test]
    fn list_query_defaults() {
        let filters = query(None, None, None).filters().unwrap();
        assert_eq!(filters, Filters::default());
    }

    #[test]
    fn list_query_rejects_non_integer_page() {
        let err = query(Some("two"), None, None).filters().unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert_eq!(
            errors.get("page").map(|e| e.message()).as_deref(),
            Some("must be an integer value")
        );
    }

    #[test]
    fn list_query_negative_page_hits_range_rule() {
        let err = query(Some("-3"), None, None).filters().unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert!(errors.get("page").is_some());
    }

    #[test]
    fn list_query_rejects_unknown_sort() {
        let err = query(None, None, Some("content")).filters().unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref e) if e.get("sort").is_some()));
    }

    #[test]
    fn list_query_parses_descending_sort() {
        let filters = query(Some("2"), Some("5"), Some("-year")).filters().unwrap();
        assert_eq!(filters.page(), 2);
        assert_eq!(filters.page_size(), 5);
        assert_eq!(filters.sort_column(), "year");
        assert_eq!(filters.sort_direction(), "DESC");
    }

    #[test]
    fn genre_list_splits_and_trims() {
        let q = ListBooksQuery {
            genres: "fantasy, adventure,,".to_string(),
            ..ListBooksQuery::default()
        };
        assert_eq!(q.genre_list(), vec!["fantasy", "adventure"]);
        assert!(ListBooksQuery::default().genre_list().is_empty());
    }

    #[test]
    fn update_request_keeps_absent_fields() {
        let mut book = Book::new(
            "Dune",
            "Spice and sand.",
            1965,
            Pages::new(412),
            vec!["sf".into()],
        );
        let req: UpdateBookRequest = serde_json::from_str(r#"{"year": 1966}"#).unwrap();
        req.apply(&mut book);

        assert_eq!(book.year, 1966);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.pages, Pages::new(412));
    }

    #[test]
    fn update_request_rejects_bad_pages() {
        let err = serde_json::from_str::<UpdateBookRequest>(r#"{"pages": "10pages"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid pages format"), "{}", err);
    }

    #[test]
    fn expected_version_header() {
        let mut headers = HeaderMap::new();
        assert!(expected_version(&headers).unwrap().is_none());

        let version = Version::from_uuid(uuid::Uuid::new_v4());
        headers.insert(EXPECTED_VERSION_HEADER, version.to_string().parse().unwrap());
        assert_eq!(expected_version(&headers).unwrap(), Some(version));

        headers.insert(EXPECTED_VERSION_HEADER, "nope".parse().unwrap());
        assert!(matches!(
            expected_version(&headers),
            Err(ApiError::BadRequest { .. })
        ));
    }
}
