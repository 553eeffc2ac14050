//! Ordering specification.

use crate::repo::error::{RepoError, RepoResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = RepoError;

    fn from_str(value: &str) -> RepoResult<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(RepoError::invalid_argument(format!(
                "unsupported order direction `{other}`; expected ASC|DESC"
            ))),
        }
    }
}

/// Insertion-ordered `(field, direction)` list.
///
/// Field names are not validated here; unknown fields reach the engine as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    entries: Vec<(String, OrderDirection)>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, direction: OrderDirection) {
        self.entries.push((field.into(), direction));
    }

    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.push(field, OrderDirection::Asc);
        self
    }

    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.push(field, OrderDirection::Desc);
        self
    }

    /// Parses `(field, "ASC"|"DESC")` pairs.
    pub fn parse<'a, I>(pairs: I) -> RepoResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut order = Self::new();
        for (field, direction) in pairs {
            order.push(field, direction.parse()?);
        }
        Ok(order)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OrderDirection)> {
        self.entries
            .iter()
            .map(|(field, direction)| (field.as_str(), *direction))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, OrderDirection)> for OrderBy {
    fn from_iter<I: IntoIterator<Item = (K, OrderDirection)>>(iter: I) -> Self {
        let mut order = Self::new();
        for (field, direction) in iter {
            order.push(field, direction);
        }
        order
    }
}
