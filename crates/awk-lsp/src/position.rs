//! Position ordering and binary searches over position-sorted slices.
//!
//! `lsp_types::Position` carries no `Ord`; everything that sorts or
//! searches by source position goes through here.

use std::cmp::Ordering;

use tower_lsp::lsp_types::{Position, Range};

pub(crate) fn cmp_position(a: Position, b: Position) -> Ordering {
    a.line.cmp(&b.line).then(a.character.cmp(&b.character))
}

/// Range covering `name` starting at `start`.
pub(crate) fn name_range(start: Position, name: &str) -> Range {
    Range::new(
        start,
        Position::new(start.line, start.character + name.len() as u32),
    )
}

/// Whether `pos` falls on the span `start..=start+len`, same line only.
/// A zero-length span matches nothing but exact equality.
pub(crate) fn covers(start: Position, len: u32, pos: Position) -> bool {
    pos.line == start.line
        && start.character <= pos.character
        && pos.character <= start.character + len
}

/// Index of the last element whose position is at or before `pos`.
pub(crate) fn last_at_or_before<T>(
    items: &[T],
    pos: Position,
    key: impl Fn(&T) -> Position,
) -> Option<usize> {
    let idx = items.partition_point(|item| cmp_position(key(item), pos) != Ordering::Greater);
    idx.checked_sub(1)
}
