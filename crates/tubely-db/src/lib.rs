//! Tubely database layer
//!
//! Repositories over PostgreSQL. Callers depend on the repository traits so
//! the upload pipeline can run against in-memory implementations in tests.

pub mod db;

pub use db::{PgVideoRepository, VideoRepository};
