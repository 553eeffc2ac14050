//! Values, rows and entity metadata shared by the query and repository layers.
//!
//! # Responsibility
//! - Define the scalar/row shapes exchanged with the persistence engine.
//! - Define the metadata capability used for field validation.
//!
//! # Invariants
//! - Hydration into domain types is the caller's concern; rows stay untyped.

pub mod metadata;
pub mod record;
pub mod value;
