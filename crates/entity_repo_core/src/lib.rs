//! Thin repositories over a query builder: criteria normalization, counting,
//! pagination and magic `findBy<Field>`-style dispatch, with a SQLite engine
//! adapter.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use config::{RepositoryConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use db::{open_db, open_db_in_memory, reflect_metadata, SqliteEntityManager};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogConfig};
pub use model::metadata::{ClassMetadata, EntityMetadata};
pub use model::record::Record;
pub use model::value::Value;
pub use query::{Criteria, Criterion, OrderBy, OrderDirection, QueryBuilder, QueryKind};
pub use repo::error::{RepoError, RepoResult};
pub use repo::magic::{MagicOperation, MagicResult};
pub use repo::manager::EntityManager;
pub use repo::paginator::Paginator;
pub use repo::relational::{QuerySource, RelationalRepository};

/// Minimal health-check API for linkage probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
