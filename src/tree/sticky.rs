//! Sticky scroll: breadcrumb rows for ancestors scrolled above the window.

use super::flatten::FlatEntry;
use super::forest::NodeId;
use std::collections::HashMap;

/// At most this many breadcrumb rows are shown.
pub const MAX_STICKY_LINES: usize = 2;

/// Row indices of the cursor's displayed ancestors that sit above `start`,
/// nearest first, capped at [`MAX_STICKY_LINES`].
pub fn sticky_ancestors(
    entries: &[FlatEntry],
    positions: &HashMap<NodeId, usize>,
    cursor: usize,
    start: usize,
) -> Vec<usize> {
    let mut rows = Vec::new();
    let Some(mut entry) = entries.get(cursor) else {
        return rows;
    };
    while let Some(parent) = entry.parent {
        let Some(&row) = positions.get(&parent) else {
            break;
        };
        if row < start {
            rows.push(row);
            if rows.len() == MAX_STICKY_LINES {
                break;
            }
        }
        entry = &entries[row];
    }
    rows
}
