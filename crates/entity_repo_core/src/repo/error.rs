//! Repository error taxonomy.
//!
//! # Invariants
//! - Validation errors are raised before any query executes.
//! - Engine failures are wrapped, never swallowed or retried.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Malformed criteria, ordering or query builder argument.
    InvalidArgument(String),
    /// Method name does not start with a recognized magic prefix.
    NoSuchMethod { class: String, method: String },
    /// Magic call names a field that is neither a field nor an association.
    InvalidCall {
        class: String,
        method: String,
        field: String,
    },
    /// Magic call supplied no comparison value.
    MissingArgument { class: String, method: String },
    Db(DbError),
    /// Engine returned something that cannot be interpreted.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NoSuchMethod { .. } => "no_such_method",
            Self::InvalidCall { .. } => "invalid_call",
            Self::MissingArgument { .. } => "missing_argument",
            Self::Db(_) => "db_error",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NoSuchMethod { class, method } => {
                write!(f, "Undefined method {class}::{method}")
            }
            Self::InvalidCall {
                class,
                method,
                field,
            } => write!(
                f,
                "Invalid call to {class}::{method}. Field \"{field}\" does not exist"
            ),
            Self::MissingArgument { class, method } => {
                write!(f, "You need to pass a parameter to {class}::{method}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid engine data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidArgument(_)
            | Self::NoSuchMethod { .. }
            | Self::InvalidCall { .. }
            | Self::MissingArgument { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
