//! SQLite persistence for the blogbench backend.
//!
//! Repositories implement the storage traits from `blogbench-core` on top of
//! a shared [`sqlx::SqlitePool`]. Schema changes live under `migrations/` and
//! are embedded into the binary at compile time.

mod article_repository;
pub mod password;
mod row;
mod user_repository;
mod util;

pub use article_repository::SqliteArticleRepository;
pub use user_repository::SqliteUserRepository;
pub use util::{create_sqlite_pool, run_migrations};

/// Embedded migrations for the blog schema.
pub const MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
