//! SQLite-backed `EntityManager`.
//!
//! # Responsibility
//! - Compile builders and run them on a borrowed connection.
//! - Convert result rows into `Record`s without type coercion.
//!
//! # Invariants
//! - Each method only accepts builders of the matching `QueryKind`.
//! - Log lines carry statement kind, counts and duration, never bound values.

use crate::model::record::Record;
use crate::model::value::Value;
use crate::query::builder::{quote_identifier, QueryBuilder, QueryKind};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::manager::EntityManager;
use log::{debug, error};
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

/// Entity manager over one SQLite connection.
pub struct SqliteEntityManager<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityManager<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn fetch_inner(&self, query: &QueryBuilder) -> RepoResult<Vec<Record>> {
        let compiled = query.compile()?;
        let mut stmt = self.conn.prepare(&compiled.sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(params_from_iter(compiled.values.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (index, column) in columns.iter().enumerate() {
                record.set(column.as_str(), Value::from(row.get_ref(index)?));
            }
            records.push(record);
        }
        Ok(records)
    }

    fn fetch_count_inner(&self, query: &QueryBuilder) -> RepoResult<u64> {
        let compiled = query.compile()?;
        let count: i64 = self.conn.query_row(
            &compiled.sql,
            params_from_iter(compiled.values.iter()),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn execute_inner(&self, query: &QueryBuilder) -> RepoResult<u64> {
        let compiled = query.compile()?;
        let changed = self
            .conn
            .execute(&compiled.sql, params_from_iter(compiled.values.iter()))?;
        Ok(changed as u64)
    }
}

impl EntityManager for SqliteEntityManager<'_> {
    type Record = Record;

    fn fetch(&self, query: &QueryBuilder) -> RepoResult<Vec<Record>> {
        ensure_kind(query, QueryKind::Select)?;
        let started_at = Instant::now();
        let result = self.fetch_inner(query);
        log_outcome("select", started_at, &result, |records| records.len() as u64);
        result
    }

    fn fetch_count(&self, query: &QueryBuilder) -> RepoResult<u64> {
        ensure_kind(query, QueryKind::Count)?;
        let started_at = Instant::now();
        let result = self.fetch_count_inner(query);
        log_outcome("count", started_at, &result, |count| *count);
        result
    }

    fn execute(&self, query: &QueryBuilder) -> RepoResult<u64> {
        ensure_kind(query, QueryKind::Delete)?;
        let started_at = Instant::now();
        let result = self.execute_inner(query);
        log_outcome("delete", started_at, &result, |changed| *changed);
        result
    }

    fn insert(&self, table: &str, record: &Record) -> RepoResult<()> {
        let started_at = Instant::now();
        let sql = if record.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
        } else {
            let columns = record
                .columns()
                .map(|(column, _)| quote_identifier(column))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; record.len()].join(", ");
            format!(
                "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                quote_identifier(table)
            )
        };

        let result = self
            .conn
            .execute(&sql, params_from_iter(record.columns().map(|(_, value)| value)))
            .map(|_| ())
            .map_err(RepoError::from);
        log_outcome("insert", started_at, &result, |_| 1);
        result
    }
}

fn ensure_kind(query: &QueryBuilder, expected: QueryKind) -> RepoResult<()> {
    if query.kind() != expected {
        return Err(RepoError::invalid_argument(format!(
            "expected a {expected:?} query builder, got {:?}",
            query.kind()
        )));
    }
    Ok(())
}

fn log_outcome<T>(
    kind: &str,
    started_at: Instant,
    result: &RepoResult<T>,
    rows: impl FnOnce(&T) -> u64,
) {
    match result {
        Ok(value) => debug!(
            "event=query_exec module=db status=ok kind={} rows={} duration_ms={}",
            kind,
            rows(value),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=query_exec module=db status=error kind={} duration_ms={} error_code={} error={}",
            kind,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
}
