//! Core domain types and traits for the blogbench blog backend.

pub mod article;
pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod random;
pub mod traits;
pub mod user;

pub use article::Article;
pub use clock::{Clock, SystemClock};
pub use config::{AppConfig, DatabaseConfig, LoadSettings, RetryConfig, RunMode, ServerConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{ArticleId, UserId};
pub use random::{RandomSource, ThreadRngSource};
pub use traits::{ArticleRepository, UserRepository};
pub use user::User;
