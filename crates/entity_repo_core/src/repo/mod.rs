//! Repository facade, magic dispatch and pagination.
//!
//! # Responsibility
//! - Define the engine capability (`EntityManager`) repositories depend on.
//! - Provide the `RelationalRepository` facade over one entity type.
//!
//! # Invariants
//! - Repositories never bypass criteria normalization for criteria input.
//! - Validation failures surface as semantic `RepoError`s before execution.

pub mod error;
pub mod magic;
pub mod manager;
pub mod paginator;
pub mod relational;
