use crate::domain::validation::FieldError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A validated, 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl PageRequest {
    /// Builds a page window from optional query parameters.
    /// Missing values fall back to the defaults and `limit` is capped at [`MAX_LIMIT`].
    ///
    /// # Errors
    /// Returns a field error for a zero `page` or `limit`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, Vec<FieldError>> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = Vec::new();
        if page == 0 {
            errors.push(FieldError::new("page", "Must be at least 1"));
        }
        if limit == 0 {
            errors.push(FieldError::new("limit", "Must be at least 1"));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self { page, limit: limit.min(MAX_LIMIT) })
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}
