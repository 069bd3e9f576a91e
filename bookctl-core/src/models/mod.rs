//! Domain models with validation at construction
//!
//! Invalid input returns `ValidationErrors` or `InvalidPagesFormat`,
//! never a panic.

pub mod book;
pub mod filters;
pub mod pages;
pub mod pagination;
pub mod validation;

pub use book::{Book, Version};
pub use filters::{Filters, Sort, SortColumn, SortDirection, UnsupportedSort, SORT_SAFELIST};
pub use pages::{InvalidPagesFormat, Pages};
pub use pagination::{calculate_metadata, Metadata, Page};
pub use validation::{ValidationError, ValidationErrors, Validator};
