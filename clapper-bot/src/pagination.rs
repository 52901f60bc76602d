//! Pagination utilities for browse views
//!
//! Browse views show one suggestion per page. Every navigation step
//! re-queries the list and clamps the requested index into range, so a list
//! that shrank between clicks still yields a valid page.

use crate::affordance::Direction;

/// Position of the shown entry within its list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Current entry (0-indexed)
    pub index: usize,
    /// Number of entries in the list
    pub total: usize,
    /// Presentation hint: false on the first page
    pub has_previous: bool,
    /// Presentation hint: false on the last page
    pub has_next: bool,
}

impl Page {
    /// Page for a requested index, clamped into the list
    ///
    /// `None` for an empty list.
    pub fn at(requested: i64, len: usize) -> Option<Self> {
        let index = clamp_index(requested, len)?;
        Some(Self {
            index,
            total: len,
            has_previous: index > 0,
            has_next: index + 1 < len,
        })
    }

    /// `Page 2 of 5`
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.index + 1, self.total)
    }
}

/// Clamp a requested index into `[0, len - 1]`
///
/// # Examples
/// ```
/// use clapper_bot::pagination::clamp_index;
///
/// assert_eq!(clamp_index(-3, 4), Some(0));
/// assert_eq!(clamp_index(2, 4), Some(2));
/// assert_eq!(clamp_index(9, 4), Some(3));
/// assert_eq!(clamp_index(0, 0), None);
/// ```
pub fn clamp_index(requested: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if requested <= 0 {
        return Some(0);
    }
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    Some(requested.min(len - 1))
}

/// Page reached by one step from `current`
pub fn navigate(current: i64, direction: Direction, len: usize) -> Option<Page> {
    let requested = match direction {
        Direction::Previous => current.saturating_sub(1),
        Direction::Next => current.saturating_add(1),
    };
    Page::at(requested, len)
}
