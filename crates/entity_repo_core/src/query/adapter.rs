//! Applies normalized predicates, ordering and bounds to a query builder.
//!
//! # Invariants
//! - Predicates are applied conjunctively, in criteria order.
//! - Order fields are never validated locally; unknown fields reach the
//!   engine unchanged.
//! - Bounds are applied after predicates and ordering.
//! - Caller-supplied builders are mutated in place.

use crate::model::metadata::EntityMetadata;
use crate::query::builder::{QueryBuilder, QueryKind};
use crate::query::criteria::{Condition, Predicate};
use crate::query::order::OrderBy;
use crate::repo::error::RepoResult;

/// Alias used for builders created by repositories.
pub const DEFAULT_ROOT_ALIAS: &str = "e";

/// Creates a fresh builder rooted at the entity table.
pub fn create_builder(
    metadata: &dyn EntityMetadata,
    kind: QueryKind,
    alias: &str,
) -> RepoResult<QueryBuilder> {
    let mut builder = QueryBuilder::new();
    builder
        .select_from(metadata.table_name(), alias)?
        .set_kind(kind);
    Ok(builder)
}

/// Builds a complete query from predicates, ordering and bounds.
pub fn build_query(
    metadata: &dyn EntityMetadata,
    kind: QueryKind,
    predicates: &[Predicate],
    order: Option<&OrderBy>,
    offset: Option<u64>,
    limit: Option<u64>,
) -> RepoResult<QueryBuilder> {
    let mut builder = create_builder(metadata, kind, DEFAULT_ROOT_ALIAS)?;
    apply_predicates(&mut builder, metadata, predicates);
    if let Some(order) = order {
        apply_order(&mut builder, metadata, order);
    }
    apply_bounds(&mut builder, offset, limit);
    Ok(builder)
}

pub fn apply_predicates(
    builder: &mut QueryBuilder,
    metadata: &dyn EntityMetadata,
    predicates: &[Predicate],
) {
    for predicate in predicates {
        let column = builder.qualify(column_for(metadata, &predicate.field));
        match &predicate.condition {
            Condition::IsNull => {
                builder.and_where(format!("{column} IS NULL"));
            }
            Condition::Equals { parameter, value } => {
                builder
                    .and_where(format!("{column} = :{parameter}"))
                    .set_parameter(parameter, value.clone());
            }
            Condition::In { parameter, values } => {
                builder
                    .and_where(format!("{column} IN (:{parameter})"))
                    .set_parameter(parameter, values.clone());
            }
        }
    }
}

pub fn apply_order(builder: &mut QueryBuilder, metadata: &dyn EntityMetadata, order: &OrderBy) {
    for (field, direction) in order.iter() {
        let expression = builder.qualify(column_for(metadata, field));
        builder.add_order_by(expression, direction);
    }
}

pub fn apply_bounds(builder: &mut QueryBuilder, offset: Option<u64>, limit: Option<u64>) {
    if offset.is_some() {
        builder.set_first_result(offset);
    }
    if limit.is_some() {
        builder.set_max_results(limit);
    }
}

fn column_for<'a>(metadata: &'a dyn EntityMetadata, field: &'a str) -> &'a str {
    metadata.column_name(field).unwrap_or(field)
}
