#![forbid(unsafe_code)]

//! Control model: one [`Cell`] per target-text position.
//!
//! Every pass of the engine reads and writes the same [`ControlSequence`].
//! The sequence is index-aligned with the target text but may be longer
//! (a tail retained from a previous, longer text) or shorter (not yet grown
//! to match a longer text).
//!
//! # Invariants
//!
//! 1. `Scrambling(n)` always has `n > 0`; a countdown that reaches zero
//!    becomes [`Cell::Pending`].
//! 2. Writers go through [`IgnoreSet::pin`]: a position whose reference
//!    character is ignored always holds [`Cell::Ignored`], never a countdown.
//! 3. [`ControlSequence::set`] past the end grows the sequence with
//!    [`Cell::Unset`]. Growth toward the text length appends
//!    [`Cell::Vacant`] instead; only the latter may be re-armed.

use std::slice;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// State of one position in the control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Hole left by a reallocation or a write past the end. Skipped by
    /// every pass until launched.
    #[default]
    Unset,
    /// Placeholder appended while the sequence grows toward the text
    /// length. Renders nothing but may be re-armed ahead of the frontier.
    Vacant,
    /// Final character for the position.
    Settled(char),
    /// Renders a random character for `n` more frames.
    Scrambling(u32),
    /// Reveal the target character on the next composition.
    Pending,
    /// Literal from the ignore set. Never scrambles.
    Ignored(char),
    /// Overdrive flash character.
    Filler(char),
}

impl Cell {
    /// Countdown of `frames`, or [`Cell::Pending`] when `frames` is zero.
    #[must_use]
    pub const fn countdown(frames: u32) -> Self {
        if frames == 0 {
            Self::Pending
        } else {
            Self::Scrambling(frames)
        }
    }

    /// Literal character held by the cell, if any.
    #[must_use]
    pub const fn literal(self) -> Option<char> {
        match self {
            Self::Settled(c) | Self::Ignored(c) | Self::Filler(c) => Some(c),
            Self::Unset | Self::Vacant | Self::Scrambling(_) | Self::Pending => None,
        }
    }

    /// Whether the cell is mid-countdown or waiting to reveal.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Scrambling(_) | Self::Pending)
    }
}

// ---------------------------------------------------------------------------
// IgnoreSet
// ---------------------------------------------------------------------------

/// Characters that bypass scrambling.
#[derive(Debug, Clone, Copy)]
pub struct IgnoreSet<'a> {
    chars: &'a [char],
}

impl<'a> IgnoreSet<'a> {
    /// Wrap a slice of ignored characters.
    #[must_use]
    pub const fn new(chars: &'a [char]) -> Self {
        Self { chars }
    }

    /// Whether `c` is ignored.
    #[must_use]
    pub fn contains(self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Assign-unless-ignored: `Ignored(reference)` when `reference` is in
    /// the set, `replacement` otherwise.
    #[must_use]
    pub fn pin(self, reference: Option<char>, replacement: Cell) -> Cell {
        match reference {
            Some(c) if self.contains(c) => Cell::Ignored(c),
            _ => replacement,
        }
    }
}

// ---------------------------------------------------------------------------
// ControlSequence
// ---------------------------------------------------------------------------

/// Ordered per-character control cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSequence {
    cells: Vec<Cell>,
}

impl ControlSequence {
    /// Empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether there are no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Overwrite the cell at `index`, growing with [`Cell::Unset`] if needed.
    pub fn set(&mut self, index: usize, cell: Cell) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, Cell::Unset);
        }
        self.cells[index] = cell;
    }

    /// Append one cell.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Drop every cell at or beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        self.cells.truncate(len);
    }

    /// Drop up to `count` trailing cells, never going below `floor`.
    /// Returns how many were removed.
    pub fn shrink_by(&mut self, count: usize, floor: usize) -> usize {
        let len = self.cells.len();
        let target = len.saturating_sub(count).max(floor).min(len);
        self.cells.truncate(target);
        len - target
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Replace the contents with `len` cells produced by `init(index)`.
    pub fn reset_to(&mut self, len: usize, init: impl FnMut(usize) -> Cell) {
        self.cells.clear();
        self.cells.extend((0..len).map(init));
    }

    /// Iterate cells in order.
    pub fn iter(&self) -> slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Mutable iteration, used by the compositor.
    pub(crate) fn iter_mut(&mut self) -> slice::IterMut<'_, Cell> {
        self.cells.iter_mut()
    }

    /// Cells as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }
}

impl<'a> IntoIterator for &'a ControlSequence {
    type Item = &'a Cell;
    type IntoIter = slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_zero_is_pending() {
        assert_eq!(Cell::countdown(0), Cell::Pending);
        assert_eq!(Cell::countdown(3), Cell::Scrambling(3));
    }

    #[test]
    fn literal_only_for_character_cells() {
        assert_eq!(Cell::Settled('a').literal(), Some('a'));
        assert_eq!(Cell::Ignored(' ').literal(), Some(' '));
        assert_eq!(Cell::Filler('_').literal(), Some('_'));
        assert_eq!(Cell::Pending.literal(), None);
        assert_eq!(Cell::Scrambling(2).literal(), None);
        assert_eq!(Cell::Unset.literal(), None);
        assert_eq!(Cell::Vacant.literal(), None);
    }

    #[test]
    fn numeric_cells_are_countdowns_and_pending() {
        assert!(Cell::Scrambling(1).is_numeric());
        assert!(Cell::Pending.is_numeric());
        assert!(!Cell::Vacant.is_numeric());
        assert!(!Cell::Settled('a').is_numeric());
    }

    #[test]
    fn pin_keeps_ignored_reference() {
        let ignore = IgnoreSet::new(&[' ', '-']);
        assert_eq!(ignore.pin(Some(' '), Cell::Scrambling(4)), Cell::Ignored(' '));
        assert_eq!(ignore.pin(Some('x'), Cell::Scrambling(4)), Cell::Scrambling(4));
        assert_eq!(ignore.pin(None, Cell::Filler('_')), Cell::Filler('_'));
    }

    #[test]
    fn set_past_end_grows_with_unset() {
        let mut seq = ControlSequence::new();
        seq.set(2, Cell::Pending);
        assert_eq!(seq.as_slice(), &[Cell::Unset, Cell::Unset, Cell::Pending]);
        seq.set(0, Cell::Settled('a'));
        assert_eq!(seq.get(0), Some(Cell::Settled('a')));
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn shrink_by_respects_floor() {
        let mut seq = ControlSequence::new();
        seq.reset_to(5, |i| Cell::Settled(char::from(b'a' + i as u8)));
        assert_eq!(seq.shrink_by(2, 2), 2);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.shrink_by(2, 2), 1);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.shrink_by(2, 2), 0);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn shrink_by_floor_above_len_is_noop() {
        let mut seq = ControlSequence::new();
        seq.push(Cell::Pending);
        assert_eq!(seq.shrink_by(3, 4), 0);
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn reset_to_replaces_contents() {
        let mut seq = ControlSequence::new();
        seq.push(Cell::Pending);
        seq.push(Cell::Pending);
        seq.push(Cell::Pending);
        seq.reset_to(2, |_| Cell::Unset);
        assert_eq!(seq.as_slice(), &[Cell::Unset, Cell::Unset]);
        seq.clear();
        assert!(seq.is_empty());
    }
}
