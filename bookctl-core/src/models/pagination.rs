//! Pagination metadata for search results

use serde::{Deserialize, Serialize};

/// Navigation data derived from a total row count.
///
/// The zero value means "nothing to paginate", which is distinct from
/// "page 1 of 1". Zero fields are omitted from JSON, so it renders as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub current_page: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub first_page: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub last_page: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub total_records: i64,
}

fn is_zero_u32(n: &u32) -> bool {
    *n == 0
}

fn is_zero_i64(n: &i64) -> bool {
    *n == 0
}

impl Metadata {
    /// True for the "no results" zero value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        i64::from(self.current_page) < self.last_page
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.current_page > 1 && !self.is_empty()
    }
}

/// Compute navigation metadata for one page of a result set.
///
/// Returns the zero value when there are no records (or no usable page
/// size). Otherwise `first_page` is 1 and `last_page` is
/// `ceil(total_records / page_size)`.
pub fn calculate_metadata(total_records: i64, page: u32, page_size: u32) -> Metadata {
    if total_records <= 0 || page_size == 0 {
        return Metadata::default();
    }

    let size = i64::from(page_size);
    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + size - 1) / size,
        total_records,
    }
}

/// One page of search results plus its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }
}
