//! bookctl-core: domain values for the bookctl catalog
//!
//! Books, their page-count text contract, search filters, pagination
//! metadata and configuration. Nothing here touches the network or the
//! database; see `bookctl-server` for the repository.

pub mod config;
pub mod error;
pub mod models;

pub use config::{BookctlConfig, Environment};
pub use error::{CoreError, Result};
pub use models::{
    calculate_metadata, Book, Filters, InvalidPagesFormat, Metadata, Page, Pages,
    ValidationErrors, Version,
};
