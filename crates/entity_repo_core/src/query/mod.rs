//! Criteria normalization, ordering and the query builder abstraction.
//!
//! # Responsibility
//! - Translate criteria mappings into predicates with unique parameters.
//! - Apply predicates, ordering and bounds to a `QueryBuilder`.
//!
//! # Invariants
//! - Nothing in this module executes queries.

pub mod adapter;
pub mod builder;
pub mod criteria;
pub mod order;

pub use builder::{CompiledQuery, Parameter, QueryBuilder, QueryKind};
pub use criteria::{normalize, Condition, Criteria, Criterion, Predicate};
pub use order::{OrderBy, OrderDirection};
