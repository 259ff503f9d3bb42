//! Identifier utilities.

use crate::error::{ArchiveError, Result};

/// Check whether `s` is a valid node id: non-empty, only `[a-z_0-9]`.
pub fn is_valid_id(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Find the single element of `items` satisfying `predicate`.
///
/// Scans in order and fails with `NotUnique` as soon as a second match is
/// seen, or with `NotFound` if nothing matched.
pub fn find_unique_element<I, T, F>(
    items: I,
    mut predicate: F,
    not_unique_msg: impl FnOnce() -> String,
    not_found_msg: impl FnOnce() -> String,
) -> Result<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> bool,
{
    let mut found = None;

    for item in items {
        if predicate(&item) {
            if found.is_some() {
                return Err(ArchiveError::NotUnique(not_unique_msg()));
            }
            found = Some(item);
        }
    }

    found.ok_or_else(|| ArchiveError::NotFound(not_found_msg()))
}
