//! SQLite engine adapter: connection bootstrap, metadata reflection and the
//! `EntityManager` implementation.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Execute rendered query builders and convert rows to `Record`s.
//!
//! # Invariants
//! - Schema ownership stays with the caller; nothing here creates tables.
//! - Bound values are never logged, only counts and durations.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod manager;
mod open;
mod reflect;

pub use manager::SqliteEntityManager;
pub use open::{open_db, open_db_in_memory};
pub use reflect::reflect_metadata;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Reflection target table does not exist.
    MissingTable(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingTable(table) => write!(f, "table `{table}` does not exist"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
