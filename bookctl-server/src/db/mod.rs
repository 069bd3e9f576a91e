//! Database layer - connection pool, deadlines, query text and repositories
//!
//! # Design Principles
//!
//! - Connection pool with a hard cap and idle reaper - no Arc<Mutex<Connection>>
//! - Optimistic concurrency via a store-regenerated version - no row locks
//! - Windowed counts for pagination - no second COUNT query
//! - Every store call bounded by an explicit `Deadline`

pub mod deadline;
pub mod pool;
pub mod query;
pub mod repos;
pub mod schema;

pub use deadline::{Deadline, STORE_TIMEOUT};
pub use pool::{create_pool, create_pool_with_options, PoolOptions};
pub use repos::{BookRepo, BookStore, DbError, Models};
