//! Search filters: page window and sort order.
//!
//! Sort identifiers are interpolated into SQL text (identifiers cannot be
//! bound parameters), so the set of sortable columns is a closed enum and a
//! `Filters` value can only be built from a safelisted sort string.

use std::fmt;
use std::str::FromStr;

use super::validation::{ValidationError, ValidationErrors, Validator};

/// Largest accepted page number
pub const MAX_PAGE: u32 = 10_000_000;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size when the caller gives none
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Every sort string callers may pass.
pub const SORT_SAFELIST: [&str; 8] = [
    "id", "title", "year", "pages", "-id", "-title", "-year", "-pages",
];

/// Sortable book columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortColumn {
    #[default]
    Id,
    Title,
    Year,
    Pages,
}

impl SortColumn {
    /// SQL identifier for this column.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Year => "year",
            Self::Pages => "pages",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A safelisted sort: column plus direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Sort string outside [`SORT_SAFELIST`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported sort '{0}'")]
pub struct UnsupportedSort(pub String);

impl FromStr for Sort {
    type Err = UnsupportedSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, name) = match s.strip_prefix('-') {
            Some(rest) => (SortDirection::Descending, rest),
            None => (SortDirection::Ascending, s),
        };
        let column = match name {
            "id" => SortColumn::Id,
            "title" => SortColumn::Title,
            "year" => SortColumn::Year,
            "pages" => SortColumn::Pages,
            _ => return Err(UnsupportedSort(s.to_owned())),
        };
        Ok(Self { column, direction })
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == SortDirection::Descending {
            f.write_str("-")?;
        }
        f.write_str(self.column.as_sql())
    }
}

/// Validated page window and ordering for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    page: u32,
    page_size: u32,
    sort: Sort,
}

impl Filters {
    /// Validate raw caller input.
    ///
    /// - page in 1..=10_000_000
    /// - page_size in 1..=100
    /// - sort in [`SORT_SAFELIST`]
    pub fn new(page: u32, page_size: u32, sort: &str) -> Result<Self, ValidationErrors> {
        let mut v = Validator::new();

        v.check(page > 0, || ValidationError::OutOfRange {
            field: "page",
            reason: "must be greater than zero".to_string(),
        });
        v.check(page <= MAX_PAGE, || ValidationError::OutOfRange {
            field: "page",
            reason: format!("must be a maximum of {}", MAX_PAGE),
        });
        v.check(page_size > 0, || ValidationError::OutOfRange {
            field: "page_size",
            reason: "must be greater than zero".to_string(),
        });
        v.check(page_size <= MAX_PAGE_SIZE, || ValidationError::OutOfRange {
            field: "page_size",
            reason: format!("must be a maximum of {}", MAX_PAGE_SIZE),
        });

        let parsed = sort.parse::<Sort>();
        if parsed.is_err() {
            v.add(ValidationError::NotPermitted {
                field: "sort",
                value: sort.to_owned(),
            });
        }

        v.finish()?;
        Ok(Self {
            page,
            page_size,
            sort: parsed.unwrap_or_default(),
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    /// SQL identifier of the primary sort column.
    pub fn sort_column(&self) -> &'static str {
        self.sort.column.as_sql()
    }

    /// `ASC` or `DESC`, from the leading `-` of the sort string.
    pub fn sort_direction(&self) -> &'static str {
        self.sort.direction.as_sql()
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}
