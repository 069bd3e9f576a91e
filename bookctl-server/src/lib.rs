//! bookctl-server: book catalog store over PostgreSQL
//!
//! The `db` module is the repository: CRUD plus full-text search with
//! pagination, optimistic concurrency on updates, and a deadline on every
//! store call. The `http` module is a thin JSON surface over it.

pub mod db;
pub mod http;

pub use db::{BookRepo, BookStore, Deadline, DbError, Models};
pub use http::{run_server, AppState, ServerConfig};
