//! Criteria mapping and its normalization into predicates.
//!
//! # Responsibility
//! - Hold `field -> criterion` mappings in insertion order.
//! - Turn criteria into conjunctive predicates with unique parameter names.
//!
//! # Invariants
//! - Normalizing empty criteria is an `InvalidArgument` error.
//! - Parameter names are unique within one normalization call.

use crate::model::value::Value;
use crate::repo::error::{RepoError, RepoResult};

/// Comparison requested for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `field = :value`
    Equals(Value),
    /// `field IN (:values)`
    In(Vec<Value>),
    /// `field IS NULL`
    IsNull,
}

impl From<Value> for Criterion {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::IsNull,
            other => Self::Equals(other),
        }
    }
}

/// Insertion-ordered `field -> criterion` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(String, Criterion)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the criterion for `field`, replacing an earlier one in place.
    pub fn insert(&mut self, field: impl Into<String>, criterion: impl Into<Criterion>) {
        let field = field.into();
        let criterion = criterion.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = criterion,
            None => self.entries.push((field, criterion)),
        }
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, Criterion::from(value.into()));
        self
    }

    pub fn any_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.insert(field, Criterion::In(values));
        self
    }

    pub fn is_null(mut self, field: impl Into<String>) -> Self {
        self.insert(field, Criterion::IsNull);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Criterion> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, criterion)| criterion)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.entries
            .iter()
            .map(|(field, criterion)| (field.as_str(), criterion))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, C> FromIterator<(K, C)> for Criteria
where
    K: Into<String>,
    C: Into<Criterion>,
{
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for (field, criterion) in iter {
            criteria.insert(field, criterion);
        }
        criteria
    }
}

impl TryFrom<serde_json::Value> for Criteria {
    type Error = RepoError;

    /// Converts a JSON object into criteria.
    ///
    /// `null` maps to `IsNull`, arrays to `In`, scalars to `Equals`.
    fn try_from(value: serde_json::Value) -> RepoResult<Self> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(RepoError::invalid_argument(format!(
                    "criteria must be a JSON object, got {}",
                    json_type_name(&other)
                )));
            }
        };

        let mut criteria = Self::new();
        for (field, value) in map {
            let criterion = match value {
                serde_json::Value::Array(items) => Criterion::In(
                    items
                        .into_iter()
                        .map(|item| json_scalar(&field, item))
                        .collect::<RepoResult<Vec<_>>>()?,
                ),
                other => Criterion::from(json_scalar(&field, other)?),
            };
            criteria.insert(field, criterion);
        }
        Ok(criteria)
    }
}

/// Comparison kind of a normalized predicate, with its bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals { parameter: String, value: Value },
    In { parameter: String, values: Vec<Value> },
    IsNull,
}

/// One comparison clause on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub condition: Condition,
}

impl Predicate {
    pub fn parameter(&self) -> Option<&str> {
        match &self.condition {
            Condition::Equals { parameter, .. } | Condition::In { parameter, .. } => {
                Some(parameter.as_str())
            }
            Condition::IsNull => None,
        }
    }
}

/// Converts criteria into one predicate per entry.
///
/// # Errors
/// - `InvalidArgument` when `criteria` is empty or a field name is blank.
pub fn normalize(criteria: &Criteria) -> RepoResult<Vec<Predicate>> {
    if criteria.is_empty() {
        return Err(RepoError::invalid_argument(
            "criteria must be a non-empty mapping or a query builder",
        ));
    }

    criteria
        .iter()
        .enumerate()
        .map(|(index, (field, criterion))| {
            if field.trim().is_empty() {
                return Err(RepoError::invalid_argument("criteria field name is empty"));
            }
            let condition = match criterion {
                Criterion::IsNull => Condition::IsNull,
                Criterion::Equals(value) => Condition::Equals {
                    parameter: parameter_name(field, index),
                    value: value.clone(),
                },
                Criterion::In(values) => Condition::In {
                    parameter: parameter_name(field, index),
                    values: values.clone(),
                },
            };
            Ok(Predicate {
                field: field.to_string(),
                condition,
            })
        })
        .collect()
}

/// Builds `p_<field>_<index>`; the prefix keeps digit-leading columns
/// matchable as `:name` placeholders.
fn parameter_name(field: &str, index: usize) -> String {
    let sanitized: String = field
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("p_{sanitized}_{index}")
}

fn json_scalar(field: &str, value: serde_json::Value) -> RepoResult<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(flag) => Ok(Value::from(flag)),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::Integer)
            .or_else(|| number.as_f64().map(Value::Real))
            .ok_or_else(|| {
                RepoError::invalid_argument(format!("unsupported number for field `{field}`"))
            }),
        serde_json::Value::String(text) => Ok(Value::Text(text)),
        other => Err(RepoError::invalid_argument(format!(
            "unsupported {} value for field `{field}`",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
