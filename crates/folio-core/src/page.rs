//! Pagination shared by every list operation.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// A clamped, 1-based page request. Construct through [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page:  u32,
  limit: u32,
}

impl PageRequest {
  /// Missing or zero values fall back to page 1 / [`DEFAULT_LIMIT`]; `limit`
  /// is capped at [`MAX_LIMIT`].
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
    Self {
      page:  page.filter(|p| *p > 0).unwrap_or(1),
      limit: limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT),
    }
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn limit(&self) -> u32 { self.limit }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(None, None) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub page:  u32,
  pub limit: u32,
  /// Matches for the whole filter, not just this page.
  pub total: u64,
  pub items: Vec<T>,
}

impl<T> Page<T> {
  pub fn new(request: PageRequest, total: u64, items: Vec<T>) -> Self {
    Self {
      page: request.page(),
      limit: request.limit(),
      total,
      items,
    }
  }
}
