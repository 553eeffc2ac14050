//! Capability interface over the persistence engine.

use crate::query::builder::QueryBuilder;
use crate::repo::error::RepoResult;

/// Narrow engine interface used by repositories.
///
/// Implementations execute compiled builders; they never validate criteria.
pub trait EntityManager {
    /// Row shape returned by `fetch`.
    type Record;

    /// Executes a `Select` builder and returns all rows.
    fn fetch(&self, query: &QueryBuilder) -> RepoResult<Vec<Self::Record>>;

    /// Executes a `Count` builder and returns the single scalar result.
    fn fetch_count(&self, query: &QueryBuilder) -> RepoResult<u64>;

    /// Executes a `Delete` builder and returns the affected row count.
    fn execute(&self, query: &QueryBuilder) -> RepoResult<u64>;

    /// Persists one new row into `table`.
    fn insert(&self, table: &str, record: &Self::Record) -> RepoResult<()>;
}
