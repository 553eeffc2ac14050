//! Mutable query builder handed between the repository and the engine.
//!
//! # Responsibility
//! - Collect root table, conjunctive conditions, named parameters, ordering
//!   and bounds for one query.
//! - Compile to SQLite SQL with positional binds.
//!
//! # Invariants
//! - One builder serves one call; builders are never shared across calls.
//! - Conditions are combined with `AND` in insertion order.
//! - Every `:name` placeholder must have a bound parameter at compile time.
//!   Text inside `'...'` literals and `"..."` identifiers is never scanned.
//! - List parameters expand to one `?` per element.

use crate::model::value::Value;
use crate::query::order::OrderDirection;
use crate::repo::error::{RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Quoted spans come first in the alternation so they are consumed whole.
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|:([A-Za-z_][A-Za-z0-9_]*)"#)
        .expect("valid placeholder regex")
});
static ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid alias regex"));

/// Statement shape produced by a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `SELECT alias.*` honoring ordering and bounds.
    Select,
    /// `SELECT COUNT(*)`; ordering and bounds are ignored.
    Count,
    /// Deletes matched rows; ordering and bounds narrow the matched set.
    Delete,
}

/// Bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Single(Value),
    List(Vec<Value>),
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<Value>> for Parameter {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

/// Compiled statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Root {
    table: String,
    alias: String,
}

/// Query builder over one root table.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    kind: QueryKind,
    root: Option<Root>,
    conditions: Vec<String>,
    parameters: Vec<(String, Parameter)>,
    order_by: Vec<(String, OrderDirection)>,
    first_result: Option<u64>,
    max_results: Option<u64>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            kind: QueryKind::Select,
            root: None,
            conditions: Vec::new(),
            parameters: Vec::new(),
            order_by: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    /// Sets the root table and its alias.
    ///
    /// # Errors
    /// - `InvalidArgument` when `alias` is not a plain identifier.
    pub fn select_from(&mut self, table: &str, alias: &str) -> RepoResult<&mut Self> {
        if !ALIAS_RE.is_match(alias) {
            return Err(RepoError::invalid_argument(format!(
                "query alias `{alias}` must be a plain identifier"
            )));
        }
        self.root = Some(Root {
            table: table.to_string(),
            alias: alias.to_string(),
        });
        Ok(self)
    }

    pub fn set_kind(&mut self, kind: QueryKind) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn root_table(&self) -> Option<&str> {
        self.root.as_ref().map(|root| root.table.as_str())
    }

    pub fn root_alias(&self) -> Option<&str> {
        self.root.as_ref().map(|root| root.alias.as_str())
    }

    /// Adds one raw SQL condition, combined with previous ones using `AND`.
    pub fn and_where(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Binds `name`, replacing an earlier binding with the same name.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<Parameter>) -> &mut Self {
        let value = value.into();
        match self
            .parameters
            .iter_mut()
            .find(|(existing, _)| existing == name)
        {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((name.to_string(), value)),
        }
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn add_order_by(
        &mut self,
        expression: impl Into<String>,
        direction: OrderDirection,
    ) -> &mut Self {
        self.order_by.push((expression.into(), direction));
        self
    }

    pub fn set_first_result(&mut self, offset: Option<u64>) -> &mut Self {
        self.first_result = offset;
        self
    }

    pub fn set_max_results(&mut self, limit: Option<u64>) -> &mut Self {
        self.max_results = limit;
        self
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn order_by(&self) -> &[(String, OrderDirection)] {
        &self.order_by
    }

    pub fn first_result(&self) -> Option<u64> {
        self.first_result
    }

    pub fn max_results(&self) -> Option<u64> {
        self.max_results
    }

    /// Qualifies `column` with the root alias, quoting the column name.
    pub fn qualify(&self, column: &str) -> String {
        match self.root_alias() {
            Some(alias) => format!("{alias}.{}", quote_identifier(column)),
            None => quote_identifier(column),
        }
    }

    /// Compiles the builder into SQL plus positional values.
    ///
    /// # Errors
    /// - `InvalidArgument` when no root table was set.
    /// - `InvalidArgument` when a placeholder has no bound parameter.
    pub fn compile(&self) -> RepoResult<CompiledQuery> {
        let root = self.root.as_ref().ok_or_else(|| {
            RepoError::invalid_argument("query builder has no root table; call select_from first")
        })?;
        let table = quote_identifier(&root.table);
        let alias = root.alias.as_str();

        let filtered = format!("FROM {table} AS {alias}{}", self.where_clause());
        let template = match self.kind {
            QueryKind::Select => format!("SELECT {alias}.* {filtered}{}", self.tail_clause()),
            QueryKind::Count => format!("SELECT COUNT(*) {filtered}"),
            QueryKind::Delete => format!(
                "DELETE FROM {table} WHERE rowid IN (SELECT {alias}.rowid {filtered}{})",
                self.tail_clause()
            ),
        };

        self.bind_placeholders(&template)
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let joined = self
            .conditions
            .iter()
            .map(|condition| format!("({condition})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {joined}")
    }

    fn tail_clause(&self) -> String {
        let mut tail = String::new();
        if !self.order_by.is_empty() {
            let joined = self
                .order_by
                .iter()
                .map(|(expression, direction)| format!("{expression} {}", direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            tail.push_str(" ORDER BY ");
            tail.push_str(&joined);
        }

        match (self.max_results, self.first_result) {
            (Some(limit), Some(offset)) if offset > 0 => {
                tail.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), _) => tail.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) if offset > 0 => {
                tail.push_str(&format!(" LIMIT -1 OFFSET {offset}"));
            }
            (None, _) => {}
        }
        tail
    }

    fn bind_placeholders(&self, template: &str) -> RepoResult<CompiledQuery> {
        let mut values = Vec::new();
        let mut unbound: Option<String> = None;

        let sql = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                return caps[0].to_string();
            };
            match self.parameter(name) {
                Some(Parameter::Single(value)) => {
                    values.push(value.clone());
                    "?".to_string()
                }
                Some(Parameter::List(items)) => {
                    values.extend(items.iter().cloned());
                    vec!["?"; items.len()].join(", ")
                }
                None => {
                    unbound.get_or_insert_with(|| name.to_string());
                    caps[0].to_string()
                }
            }
        });

        if let Some(name) = unbound {
            return Err(RepoError::invalid_argument(format!(
                "query parameter `{name}` is not bound"
            )));
        }

        Ok(CompiledQuery {
            sql: sql.into_owned(),
            values,
        })
    }
}

/// Double-quotes an SQL identifier, escaping embedded quotes.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
