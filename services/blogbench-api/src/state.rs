//! Shared state for the blog API handlers.

use std::sync::Arc;

use blogbench_core::{ArticleRepository, Clock, RandomSource, UserRepository};

/// Everything a request handler needs: the repositories plus the injectable
/// randomness and clock, so tests can pin ids and timestamps.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub random: Arc<dyn RandomSource>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        articles: Arc<dyn ArticleRepository>,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            articles,
            random,
            clock,
        }
    }
}
