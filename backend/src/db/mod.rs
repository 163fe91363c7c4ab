//! Persistence for schedules and the school directory.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / services (crate::services)             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/)                        │
//! │  - ScheduleRepository                                   │
//! │  - DirectoryRepository                                  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼──────────────────┐  ┌──────────▼──────────────┐
//! │ PostgresRepository   │  │ LocalRepository         │
//! │ (Diesel, r2d2)       │  │ (in-memory)             │
//! └──────────────────────┘  └─────────────────────────┘
//! ```
//!
//! Backends are chosen at runtime through [`RepositoryFactory`] /
//! [`RepositoryBuilder`]; the server binary uses the process-wide instance
//! from [`init_repository`] and [`get_repository`].

// Feature flag priority: postgres > local
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    DirectoryRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    ScheduleFilter, ScheduleQuery, ScheduleRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton.
///
/// The backend comes from `REPOSITORY_TYPE` (or the presence of a database
/// URL); with only `local-repo` compiled in, the in-memory repository is
/// always used. Calling this again after a successful init is a no-op.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    #[cfg(feature = "postgres-repo")]
    let repo = RepositoryFactory::from_env()
        .await
        .context("Failed to initialize repository")?;

    #[cfg(not(feature = "postgres-repo"))]
    let repo = {
        if RepositoryType::from_env() == RepositoryType::Postgres {
            log::warn!("Postgres requested but the postgres-repo feature is disabled; using local");
        }
        RepositoryFactory::create_local()
    };

    let _ = REPOSITORY.set(repo);
    REPOSITORY
        .get()
        .context("Repository singleton was not stored")
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}
