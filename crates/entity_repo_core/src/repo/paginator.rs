//! Pagination cursor over a select query.
//!
//! # Responsibility
//! - Execute the bounded page query on demand.
//! - Compute the total row count lazily and cache it.
//!
//! # Invariants
//! - Pages are 1-based; page `0` is treated as page `1`.
//! - The cached total is dropped whenever page bounds change.
//! - `items()` re-executes on every call, so a cursor can be restarted.

use crate::query::builder::{QueryBuilder, QueryKind};
use crate::repo::error::RepoResult;
use crate::repo::manager::EntityManager;
use log::debug;
use std::cell::Cell;

/// Lazy, restartable page view over one query.
pub struct Paginator<'m, M: EntityManager> {
    manager: &'m M,
    query: QueryBuilder,
    current_page: u64,
    items_per_page: u64,
    total: Cell<Option<u64>>,
}

impl<'m, M: EntityManager> Paginator<'m, M> {
    /// Wraps `query`; its own bounds are replaced by the page bounds.
    pub fn new(manager: &'m M, mut query: QueryBuilder, items_per_page: u32) -> Self {
        query.set_kind(QueryKind::Select);
        Self {
            manager,
            query,
            current_page: 1,
            items_per_page: u64::from(items_per_page.max(1)),
            total: Cell::new(None),
        }
    }

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn items_per_page(&self) -> u64 {
        self.items_per_page
    }

    pub fn set_current_page(&mut self, page: u64) -> &mut Self {
        let page = page.max(1);
        if page != self.current_page {
            self.current_page = page;
            self.total.set(None);
        }
        self
    }

    pub fn set_items_per_page(&mut self, items_per_page: u32) -> &mut Self {
        let items_per_page = u64::from(items_per_page.max(1));
        if items_per_page != self.items_per_page {
            self.items_per_page = items_per_page;
            self.total.set(None);
        }
        self
    }

    /// Offset of the first row of the current page.
    pub fn offset(&self) -> u64 {
        (self.current_page - 1).saturating_mul(self.items_per_page)
    }

    /// Total matched rows, ignoring page bounds.
    pub fn total_count(&self) -> RepoResult<u64> {
        if let Some(total) = self.total.get() {
            return Ok(total);
        }

        let mut count_query = self.query.clone();
        count_query
            .set_kind(QueryKind::Count)
            .set_first_result(None)
            .set_max_results(None);
        let total = self.manager.fetch_count(&count_query)?;
        debug!(
            "event=paginator_count module=repo status=ok total={} page={} per_page={}",
            total, self.current_page, self.items_per_page
        );
        self.total.set(Some(total));
        Ok(total)
    }

    /// Number of pages given the total count; `0` when nothing matches.
    pub fn page_count(&self) -> RepoResult<u64> {
        let total = self.total_count()?;
        Ok(total.div_ceil(self.items_per_page))
    }

    /// Rows of the current page.
    pub fn items(&self) -> RepoResult<Vec<M::Record>> {
        let mut page_query = self.query.clone();
        page_query
            .set_first_result(Some(self.offset()))
            .set_max_results(Some(self.items_per_page));
        self.manager.fetch(&page_query)
    }
}
