//! Line selection for one parsed diff.
//!
//! A [`Selection`] holds [`LineId`]s, which only mean something for the
//! [`FileDiff`] they were taken from. [`DiffSession`] keeps the two together
//! and drops the selection whenever the diff is replaced.

use crate::diff::{DiffLine, FileDiff, LineId};
use crate::parse::LineRef;
use crate::patch::{Direction, PartialPatch, synthesize};
use crate::status::StatusLists;
use std::collections::BTreeSet;

/// Set of selected change lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    lines: BTreeSet<LineId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single line, or flip its membership when `extend` is set.
    ///
    /// Only additions and removals can be selected. Without `extend`, picking
    /// a context or header line clears the selection; with `extend` it does
    /// nothing.
    pub fn toggle(&mut self, line: &DiffLine, extend: bool) {
        if !extend {
            self.lines.clear();
            if line.is_change() {
                self.lines.insert(line.id);
            }
            return;
        }

        if line.is_change() && !self.lines.remove(&line.id) {
            self.lines.insert(line.id);
        }
    }

    /// Replace the selection with every change line between two positions of
    /// the diff's flattened line sequence (see [`FileDiff::lines`]).
    ///
    /// Positions are inclusive and may come in either order, as from a drag
    /// gesture. The far end is clamped to the last line; a range lying wholly
    /// past the end clears the selection.
    pub fn select_range(&mut self, diff: &FileDiff, start: usize, end: usize) {
        let (first, last) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };

        self.lines = diff
            .lines()
            .skip(first)
            .take((last - first).saturating_add(1))
            .filter(|line| line.is_change())
            .map(|line| line.id)
            .collect();
    }

    /// Select every change line matched by a line reference.
    pub fn from_refs(diff: &FileDiff, refs: &[LineRef]) -> Self {
        let lines = diff
            .lines()
            .filter(|line| line.is_change() && refs.iter().any(|r| r.matches(line)))
            .map(|line| line.id)
            .collect();
        Self { lines }
    }

    /// Select every change line of the diff.
    pub fn all(diff: &FileDiff) -> Self {
        let lines = diff
            .lines()
            .filter(|line| line.is_change())
            .map(|line| line.id)
            .collect();
        Self { lines }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn contains(&self, id: LineId) -> bool {
        self.lines.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.iter().copied()
    }

    /// The selected lines of `diff`, in diff order.
    pub fn selected_lines<'a>(&'a self, diff: &'a FileDiff) -> impl Iterator<Item = &'a DiffLine> {
        diff.lines().filter(|line| self.contains(line.id))
    }
}

/// One open diff of one path, with its live selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSession {
    path: String,
    staged: bool,
    diff: FileDiff,
    selection: Selection,
}

impl DiffSession {
    /// Parse `raw` for `path`. `staged` marks a `--cached` diff, whose lines
    /// can only be unstaged.
    pub fn load(path: impl Into<String>, staged: bool, raw: &str) -> Self {
        Self {
            path: path.into(),
            staged,
            diff: FileDiff::parse(raw),
            selection: Selection::new(),
        }
    }

    /// Re-parse after the file or index changed. Old line ids are invalid,
    /// so the selection is cleared.
    pub fn reload(&mut self, raw: &str) {
        self.diff = FileDiff::parse(raw);
        self.selection.clear();
    }

    /// Whether this session survives a status re-scan.
    ///
    /// Returns `false` (and clears the selection) when the path is no longer
    /// listed; callers should then drop the session.
    pub fn retain_in(&mut self, lists: &StatusLists) -> bool {
        let listed = lists.contains(&self.path);
        if !listed {
            self.selection.clear();
        }
        listed
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_staged(&self) -> bool {
        self.staged
    }

    pub fn diff(&self) -> &FileDiff {
        &self.diff
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn direction(&self) -> Direction {
        if self.staged {
            Direction::Unstage
        } else {
            Direction::Stage
        }
    }

    pub fn can_stage(&self) -> bool {
        !self.staged && !self.selection.is_empty()
    }

    pub fn can_unstage(&self) -> bool {
        self.staged && !self.selection.is_empty()
    }

    /// Patch for the current selection in this session's direction.
    pub fn patch(&self) -> PartialPatch {
        synthesize(&self.diff, &self.selection, self.direction(), &self.path)
    }
}
