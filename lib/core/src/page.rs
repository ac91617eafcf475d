//! Offset pagination for list operations.

use serde::{Deserialize, Serialize};

/// Number of records returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: u32 = 20;

/// Upper bound on a single page.
pub const MAX_LIMIT: u32 = 100;

/// A window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    offset: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Page {
    /// Creates a page, clamping the limit into `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Number of records to skip.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Maximum number of records to return.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Applies the window to an already ordered iterator.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit() as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}
