//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::SchedulingPolicy;
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// School day and session limits used by validation and reports
    pub policy: Arc<SchedulingPolicy>,
}

impl AppState {
    /// Create a new application state with the default scheduling policy.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_policy(repository, SchedulingPolicy::default())
    }

    pub fn with_policy(repository: Arc<dyn FullRepository>, policy: SchedulingPolicy) -> Self {
        Self {
            repository,
            policy: Arc::new(policy),
        }
    }
}
