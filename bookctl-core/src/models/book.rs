//! Book record and its validation rules

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{unique, ValidationError, ValidationErrors, Validator};
use super::Pages;

/// Maximum title length in bytes
pub const MAX_TITLE_LEN: usize = 500;

/// Minimum content length in bytes
pub const MIN_CONTENT_LEN: usize = 10;

/// Earliest accepted publication year
pub const MIN_YEAR: i32 = 1888;

/// Maximum number of genres per book
pub const MAX_GENRES: usize = 5;

/// Opaque concurrency token.
///
/// The store regenerates it on every successful mutation. Callers only ever
/// compare it for equality; it carries no ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(Uuid);

impl Version {
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for Version {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A catalog record.
///
/// `id`, `created_at` and `version` are assigned by the store; a freshly
/// built book carries their zero values until it is inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "is_zero_year")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Pages::is_zero")]
    pub pages: Pages,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: Version,
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

impl Book {
    /// Build an unsaved book from its mutable fields.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        year: i32,
        pages: Pages,
        genres: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            year,
            pages,
            genres,
            ..Self::default()
        }
    }

    /// True once the store has assigned an identity.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Validate against the current calendar year.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_for_year(Utc::now().year())
    }

    /// Validate all mutable fields, treating `current_year` as the latest
    /// acceptable publication year.
    pub fn validate_for_year(&self, current_year: i32) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();

        v.check(!self.title.is_empty(), || ValidationError::Missing {
            field: "title",
        });
        v.check(self.title.len() <= MAX_TITLE_LEN, || ValidationError::TooLong {
            field: "title",
            max: MAX_TITLE_LEN,
        });

        v.check(self.content.len() >= MIN_CONTENT_LEN, || {
            ValidationError::TooShort {
                field: "content",
                min: MIN_CONTENT_LEN,
            }
        });

        v.check(self.year != 0, || ValidationError::Missing { field: "year" });
        v.check(self.year >= MIN_YEAR, || ValidationError::OutOfRange {
            field: "year",
            reason: format!("must be greater than {}", MIN_YEAR),
        });
        v.check(self.year <= current_year, || ValidationError::OutOfRange {
            field: "year",
            reason: "must not be in the future".to_string(),
        });

        v.check(!self.pages.is_zero(), || ValidationError::Missing {
            field: "pages",
        });
        v.check(self.pages.get() > 0, || ValidationError::OutOfRange {
            field: "pages",
            reason: "must be a positive integer".to_string(),
        });

        v.check(!self.genres.is_empty(), || ValidationError::OutOfRange {
            field: "genres",
            reason: "must contain at least 1 genre".to_string(),
        });
        v.check(self.genres.len() <= MAX_GENRES, || {
            ValidationError::OutOfRange {
                field: "genres",
                reason: format!("must not contain more than {} genres", MAX_GENRES),
            }
        });
        v.check(unique(&self.genres), || ValidationError::Duplicate {
            field: "genres",
        });

        v.finish()
    }
}
