//! Relational repository facade.
//!
//! # Responsibility
//! - Expose find/count/remove operations for one entity type.
//! - Resolve magic `findBy<Field>`-style calls into criteria queries.
//!
//! # Invariants
//! - Manager and metadata are fixed at construction and never mutated.
//! - Every validation error is raised before any query executes.
//! - Caller-supplied query builders are mutated in place, never cloned
//!   before mutation.

use crate::config::RepositoryConfig;
use crate::model::metadata::EntityMetadata;
use crate::model::value::Value;
use crate::query::adapter::{apply_order, build_query, create_builder, DEFAULT_ROOT_ALIAS};
use crate::query::builder::{QueryBuilder, QueryKind};
use crate::query::criteria::{normalize, Criteria};
use crate::query::order::OrderBy;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::magic::{parse_magic_method, MagicOperation, MagicResult};
use crate::repo::manager::EntityManager;
use crate::repo::paginator::Paginator;
use log::{debug, warn};

/// Query input accepted by `find_paginated_by` and `count_by`.
#[derive(Debug)]
pub enum QuerySource<'q> {
    /// Normalized into a fresh builder owned by the call.
    Criteria(Criteria),
    /// Used as-is and mutated in place.
    Builder(&'q mut QueryBuilder),
}

impl From<Criteria> for QuerySource<'_> {
    fn from(criteria: Criteria) -> Self {
        Self::Criteria(criteria)
    }
}

impl<'q> From<&'q mut QueryBuilder> for QuerySource<'q> {
    fn from(builder: &'q mut QueryBuilder) -> Self {
        Self::Builder(builder)
    }
}

/// Repository over one entity type.
pub struct RelationalRepository<'m, M: EntityManager, D: EntityMetadata> {
    manager: &'m M,
    metadata: D,
    config: RepositoryConfig,
}

impl<'m, M: EntityManager, D: EntityMetadata> RelationalRepository<'m, M, D> {
    pub fn new(manager: &'m M, metadata: D) -> Self {
        Self {
            manager,
            metadata,
            config: RepositoryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Fully qualified entity name.
    pub fn class_name(&self) -> &str {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &D {
        &self.metadata
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates a select builder rooted at this entity's table.
    pub fn create_query_builder(&self, alias: &str) -> RepoResult<QueryBuilder> {
        create_builder(&self.metadata, QueryKind::Select, alias)
    }

    pub fn find_by(
        &self,
        criteria: &Criteria,
        order: Option<&OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> RepoResult<Vec<M::Record>> {
        let predicates = normalize(criteria)?;
        let query = build_query(
            &self.metadata,
            QueryKind::Select,
            &predicates,
            order,
            offset,
            limit,
        )?;
        let records = self.manager.fetch(&query)?;
        debug!(
            "event=repo_find module=repo status=ok entity={} criteria={} rows={}",
            self.class_name(),
            criteria.len(),
            records.len()
        );
        Ok(records)
    }

    pub fn find_one_by(
        &self,
        criteria: &Criteria,
        order: Option<&OrderBy>,
    ) -> RepoResult<Option<M::Record>> {
        let records = self.find_by(criteria, order, Some(1), None)?;
        Ok(records.into_iter().next())
    }

    pub fn find_all(&self) -> RepoResult<Vec<M::Record>> {
        let query = create_builder(&self.metadata, QueryKind::Select, DEFAULT_ROOT_ALIAS)?;
        self.manager.fetch(&query)
    }

    /// Returns a paginator over the matched rows.
    ///
    /// Ordering fields are not validated; unknown fields fail only when the
    /// paginator executes. `items_per_page` is normalized through the
    /// repository config.
    pub fn find_paginated_by<'q>(
        &self,
        source: impl Into<QuerySource<'q>>,
        order: Option<&OrderBy>,
        items_per_page: Option<u32>,
    ) -> RepoResult<Paginator<'m, M>> {
        let query = match source.into() {
            QuerySource::Criteria(criteria) => {
                let predicates = normalize(&criteria)?;
                build_query(
                    &self.metadata,
                    QueryKind::Select,
                    &predicates,
                    order,
                    None,
                    None,
                )?
            }
            QuerySource::Builder(builder) => {
                self.ensure_root(builder)?;
                builder.set_kind(QueryKind::Select);
                if let Some(order) = order {
                    apply_order(builder, &self.metadata, order);
                }
                builder.clone()
            }
        };

        let per_page = self.config.normalize_page_size(items_per_page);
        debug!(
            "event=repo_paginate module=repo status=ok entity={} per_page={}",
            self.class_name(),
            per_page
        );
        Ok(Paginator::new(self.manager, query, per_page))
    }

    /// Counts matched rows immediately.
    pub fn count_by<'q>(&self, source: impl Into<QuerySource<'q>>) -> RepoResult<u64> {
        let count = match source.into() {
            QuerySource::Criteria(criteria) => {
                let predicates = normalize(&criteria)?;
                let query = build_query(
                    &self.metadata,
                    QueryKind::Count,
                    &predicates,
                    None,
                    None,
                    None,
                )?;
                self.manager.fetch_count(&query)?
            }
            QuerySource::Builder(builder) => {
                self.ensure_root(builder)?;
                builder.set_kind(QueryKind::Count);
                self.manager.fetch_count(builder)?
            }
        };
        debug!(
            "event=repo_count module=repo status=ok entity={} count={}",
            self.class_name(),
            count
        );
        Ok(count)
    }

    pub fn count_all(&self) -> RepoResult<u64> {
        let query = create_builder(&self.metadata, QueryKind::Count, DEFAULT_ROOT_ALIAS)?;
        self.manager.fetch_count(&query)
    }

    /// Deletes every matched row and returns how many were removed.
    pub fn remove_by(&self, criteria: &Criteria) -> RepoResult<u64> {
        let predicates = normalize(criteria)?;
        let query = build_query(
            &self.metadata,
            QueryKind::Delete,
            &predicates,
            None,
            None,
            None,
        )?;
        let removed = self.manager.execute(&query)?;
        self.log_removed("repo_remove", removed);
        Ok(removed)
    }

    /// Deletes the first matched row, by identifier order.
    ///
    /// Falls back to `rowid` order when the identifier is not a declared
    /// field. Returns `0` when nothing matches; never removes more than one
    /// row.
    pub fn remove_one_by(&self, criteria: &Criteria) -> RepoResult<u64> {
        let predicates = normalize(criteria)?;
        let identifier = self.metadata.identifier();
        let order_field = if self.metadata.has_field(identifier) {
            identifier
        } else {
            "rowid"
        };
        let order = OrderBy::new().asc(order_field);
        let query = build_query(
            &self.metadata,
            QueryKind::Delete,
            &predicates,
            Some(&order),
            None,
            Some(1),
        )?;
        let removed = self.manager.execute(&query)?;
        self.log_removed("repo_remove_one", removed);
        Ok(removed)
    }

    pub fn remove_all(&self) -> RepoResult<u64> {
        let query = create_builder(&self.metadata, QueryKind::Delete, DEFAULT_ROOT_ALIAS)?;
        let removed = self.manager.execute(&query)?;
        self.log_removed("repo_remove_all", removed);
        Ok(removed)
    }

    /// Persists one new row for this entity.
    pub fn add(&self, record: &M::Record) -> RepoResult<()> {
        self.manager.insert(self.metadata.table_name(), record)
    }

    /// Resolves and runs a magic method such as `findOneByEmail`.
    ///
    /// Validation order: method prefix, argument presence, field existence.
    ///
    /// # Errors
    /// - `NoSuchMethod` when `method` has no recognized prefix.
    /// - `MissingArgument` when `args` is empty.
    /// - `InvalidCall` when the field is neither a field nor an association.
    pub fn call(&self, method: &str, args: &[Value]) -> RepoResult<MagicResult<M::Record>> {
        let Some(parsed) = parse_magic_method(method) else {
            return Err(self.reject(RepoError::NoSuchMethod {
                class: self.class_name().to_string(),
                method: method.to_string(),
            }));
        };

        let Some(value) = args.first() else {
            return Err(self.reject(RepoError::MissingArgument {
                class: self.class_name().to_string(),
                method: method.to_string(),
            }));
        };

        let field = self.metadata.resolve_field(parsed.field);
        self.ensure_declared(method, &field)?;
        self.run_magic(parsed.operation, &field, value.clone())
    }

    /// Runs `operation` on `field = value` without method-name parsing.
    ///
    /// # Errors
    /// - `InvalidCall` when the field is neither a field nor an association.
    pub fn dispatch(
        &self,
        operation: MagicOperation,
        field: &str,
        value: impl Into<Value>,
    ) -> RepoResult<MagicResult<M::Record>> {
        let method = format!("{}{}", operation.prefix(), upper_first(field));
        self.ensure_declared(&method, field)?;
        self.run_magic(operation, field, value.into())
    }

    fn run_magic(
        &self,
        operation: MagicOperation,
        field: &str,
        value: Value,
    ) -> RepoResult<MagicResult<M::Record>> {
        let criteria = Criteria::new().eq(field, value);
        match operation {
            MagicOperation::FindBy => self
                .find_by(&criteria, None, None, None)
                .map(MagicResult::Many),
            MagicOperation::FindOneBy => self.find_one_by(&criteria, None).map(MagicResult::One),
            MagicOperation::CountBy => self.count_by(criteria).map(MagicResult::Count),
            MagicOperation::RemoveBy => self.remove_by(&criteria).map(MagicResult::Removed),
            MagicOperation::RemoveOneBy => self.remove_one_by(&criteria).map(MagicResult::Removed),
        }
    }

    fn ensure_declared(&self, method: &str, field: &str) -> RepoResult<()> {
        if self.metadata.has_field(field) || self.metadata.has_association(field) {
            return Ok(());
        }
        Err(self.reject(RepoError::InvalidCall {
            class: self.class_name().to_string(),
            method: method.to_string(),
            field: field.to_string(),
        }))
    }

    fn ensure_root(&self, builder: &mut QueryBuilder) -> RepoResult<()> {
        if builder.root_table().is_none() {
            builder.select_from(self.metadata.table_name(), DEFAULT_ROOT_ALIAS)?;
        }
        Ok(())
    }

    fn reject(&self, err: RepoError) -> RepoError {
        warn!(
            "event=magic_call module=repo status=error entity={} error_code={} error={}",
            self.class_name(),
            err.code(),
            err
        );
        err
    }

    fn log_removed(&self, event: &str, removed: u64) {
        debug!(
            "event={} module=repo status=ok entity={} removed={}",
            event,
            self.class_name(),
            removed
        );
    }
}

fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
