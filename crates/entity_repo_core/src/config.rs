//! Repository configuration defaults.

/// Items per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound for items per page.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Tunables shared by all operations of one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl RepositoryConfig {
    /// Maps `None`/`0` to the default page size and clamps to the maximum.
    pub fn normalize_page_size(&self, page_size: Option<u32>) -> u32 {
        match page_size {
            Some(0) | None => self.default_page_size.min(self.max_page_size),
            Some(value) if value > self.max_page_size => self.max_page_size,
            Some(value) => value,
        }
    }
}
