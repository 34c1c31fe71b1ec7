//! Partial patch synthesis.
//!
//! Rebuilds a smaller unified diff from a parsed [`FileDiff`] and a
//! [`Selection`], so that `git apply --cached` changes only the selected
//! lines in the index. Hunk counts are recomputed from the filtered lines;
//! git rejects a hunk whose declared counts disagree with its body.

use crate::diff::{DiffHunk, DiffLineKind, FileDiff};
use crate::selection::Selection;
use std::fmt;

/// Which way the selected lines move between work tree and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Work tree to index; the diff comes from `git diff`
    Stage,
    /// Index back to HEAD; the diff comes from `git diff --cached` and the
    /// patch is applied in reverse
    Unstage,
}

impl Direction {
    /// Whether the patch has to be applied with `--reverse`.
    pub fn is_reverse(self) -> bool {
        self == Direction::Unstage
    }
}

/// A line of a synthesized hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    /// Context, Addition or Removal
    pub kind: DiffLineKind,
    pub content: String,
}

/// A hunk with counts recomputed from its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<PatchLine>,
}

impl PatchHunk {
    /// Filter one hunk through the selection.
    ///
    /// Unselected lines keep their current index state: when staging, an
    /// unselected addition is not in the index yet and is dropped, while an
    /// unselected removal is still in the index and becomes context. Unstaging
    /// is the mirror image. Returns `None` when no line of the hunk is selected.
    fn from_selection(hunk: &DiffHunk, selection: &Selection, direction: Direction) -> Option<Self> {
        if !hunk.body().any(|line| selection.contains(line.id)) {
            return None;
        }

        let (old_start, new_start) = hunk.starts();
        let mut result = PatchHunk {
            old_start,
            old_count: 0,
            new_start,
            new_count: 0,
            lines: Vec::new(),
        };

        for line in hunk.body() {
            let selected = selection.contains(line.id);
            let kind = match (line.kind, selected, direction) {
                (DiffLineKind::Context, _, _) => DiffLineKind::Context,
                (DiffLineKind::Addition, true, _) => DiffLineKind::Addition,
                (DiffLineKind::Addition, false, Direction::Stage) => continue,
                (DiffLineKind::Addition, false, Direction::Unstage) => DiffLineKind::Context,
                (DiffLineKind::Removal, true, _) => DiffLineKind::Removal,
                (DiffLineKind::Removal, false, Direction::Stage) => DiffLineKind::Context,
                (DiffLineKind::Removal, false, Direction::Unstage) => continue,
                (DiffLineKind::Header, _, _) => continue,
            };
            result.push(kind, &line.content);
        }

        (!result.lines.is_empty()).then_some(result)
    }

    fn push(&mut self, kind: DiffLineKind, content: &str) {
        match kind {
            DiffLineKind::Context => {
                self.old_count += 1;
                self.new_count += 1;
            }
            DiffLineKind::Addition => self.new_count += 1,
            DiffLineKind::Removal => self.old_count += 1,
            DiffLineKind::Header => return,
        }
        self.lines.push(PatchLine {
            kind,
            content: content.to_string(),
        });
    }
}

impl fmt::Display for PatchHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )?;
        for line in &self.lines {
            if let Some(marker) = line.kind.marker() {
                writeln!(f, "{}{}", marker, line.content)?;
            }
        }
        Ok(())
    }
}

/// A synthesized single-file patch.
///
/// Renders (via [`fmt::Display`]) as the `diff --git`, `---` and `+++` headers
/// followed by every hunk. A patch without hunks is a no-op: it is still valid
/// text, but there is nothing to hand to git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialPatch {
    pub path: String,
    pub direction: Direction,
    pub hunks: Vec<PatchHunk>,
}

impl PartialPatch {
    pub fn is_noop(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Number of selected additions and removals carried by the patch.
    pub fn changed_lines(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|hunk| &hunk.lines)
            .filter(|line| line.kind.is_change())
            .count()
    }
}

impl fmt::Display for PartialPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "diff --git a/{} b/{}", self.path, self.path)?;
        writeln!(f, "--- a/{}", self.path)?;
        writeln!(f, "+++ b/{}", self.path)?;

        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }

        Ok(())
    }
}

/// Build a patch that moves exactly the selected lines of `diff`.
///
/// Hunks are processed independently, keeping their original start lines;
/// hunks without a selected line are left out. An empty selection yields a
/// no-op patch.
pub fn synthesize(
    diff: &FileDiff,
    selection: &Selection,
    direction: Direction,
    path: &str,
) -> PartialPatch {
    let hunks = diff
        .hunks
        .iter()
        .filter_map(|hunk| PatchHunk::from_selection(hunk, selection, direction))
        .collect();

    PartialPatch {
        path: path.to_string(),
        direction,
        hunks,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::DiffLine;
    use similar_asserts::assert_eq;

    fn pick<'a>(diff: &'a FileDiff, content: &str, kind: DiffLineKind) -> &'a DiffLine {
        diff.lines()
            .find(|line| line.content == content && line.kind == kind)
            .unwrap()
    }

    fn select(diff: &FileDiff, picks: &[(&str, DiffLineKind)]) -> Selection {
        let mut selection = Selection::new();
        for (content, kind) in picks {
            selection.toggle(pick(diff, content, *kind), true);
        }
        selection
    }

    #[test]
    fn stage_single_addition_with_context() {
        let diff = FileDiff::parse(
            "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1,2 +1,3 @@\n line1\n+line2\n line3\n",
        );
        let selection = select(&diff, &[("line2", DiffLineKind::Addition)]);

        let patch = synthesize(&diff, &selection, Direction::Stage, "x");

        insta::assert_snapshot!(patch.to_string(), @r"
        diff --git a/x b/x
        --- a/x
        +++ b/x
        @@ -1,2 +1,3 @@
         line1
        +line2
         line3
        ");
    }

    #[test]
    fn stage_first_of_two_removals() {
        let diff = FileDiff::parse("@@ -4,4 +4,2 @@\n a\n-b\n-c\n d\n");
        let selection = select(&diff, &[("b", DiffLineKind::Removal)]);

        let patch = synthesize(&diff, &selection, Direction::Stage, "f.txt");

        assert_eq!(
            patch.hunks,
            vec![PatchHunk {
                old_start: 4,
                old_count: 4,
                new_start: 4,
                new_count: 3,
                lines: vec![
                    PatchLine { kind: DiffLineKind::Context, content: "a".into() },
                    PatchLine { kind: DiffLineKind::Removal, content: "b".into() },
                    PatchLine { kind: DiffLineKind::Context, content: "c".into() },
                    PatchLine { kind: DiffLineKind::Context, content: "d".into() },
                ],
            }]
        );
    }

    #[test]
    fn stage_drops_unselected_additions() {
        let diff = FileDiff::parse("@@ -10,2 +10,3 @@\n-old one\n-old two\n+new one\n+new two\n+new three\n");
        let selection = select(&diff, &[("new three", DiffLineKind::Addition)]);

        let patch = synthesize(&diff, &selection, Direction::Stage, "gtk.nix");

        assert_eq!(
            patch.hunks[0].to_string(),
            "@@ -10,2 +10,3 @@\n old one\n old two\n+new three\n"
        );
    }

    #[test]
    fn unstage_keeps_unselected_additions_as_context() {
        let diff = FileDiff::parse("@@ -1,3 +1,5 @@\n one\n+NEW1\n two\n three\n+NEW2\n");
        let selection = select(&diff, &[("NEW1", DiffLineKind::Addition)]);

        let patch = synthesize(&diff, &selection, Direction::Unstage, "f.txt");

        assert_eq!(
            patch.hunks[0].to_string(),
            "@@ -1,4 +1,5 @@\n one\n+NEW1\n two\n three\n NEW2\n"
        );
    }

    #[test]
    fn unstage_drops_unselected_removals() {
        let diff = FileDiff::parse("@@ -1,4 +1,2 @@\n a\n-b\n-c\n d\n");
        let selection = select(&diff, &[("c", DiffLineKind::Removal)]);

        let patch = synthesize(&diff, &selection, Direction::Unstage, "f.txt");

        assert_eq!(patch.hunks[0].to_string(), "@@ -1,3 +1,2 @@\n a\n-c\n d\n");
        assert!(patch.direction.is_reverse());
    }

    #[test]
    fn selected_lines_pass_through_in_both_directions() {
        let diff = FileDiff::parse("@@ -7,2 +7,2 @@\n-before\n+after\n ctx\n");
        let selection = Selection::all(&diff);

        for direction in [Direction::Stage, Direction::Unstage] {
            let patch = synthesize(&diff, &selection, direction, "f");
            assert_eq!(
                patch.hunks[0].to_string(),
                "@@ -7,2 +7,2 @@\n-before\n+after\n ctx\n"
            );
        }
    }

    #[test]
    fn hunks_without_selection_are_omitted() {
        let diff = FileDiff::parse(
            "@@ -1,2 +1,3 @@\n a\n+b\n c\n@@ -20,2 +21,3 @@\n x\n+y\n z\n@@ -40 +42 @@\n-p\n+q\n",
        );
        let selection = select(&diff, &[("y", DiffLineKind::Addition)]);

        let patch = synthesize(&diff, &selection, Direction::Stage, "multi.txt");

        insta::assert_snapshot!(patch.to_string(), @r"
        diff --git a/multi.txt b/multi.txt
        --- a/multi.txt
        +++ b/multi.txt
        @@ -20,2 +21,3 @@
         x
        +y
         z
        ");
    }

    #[test]
    fn empty_selection_is_noop() {
        let diff = FileDiff::parse("@@ -1,2 +1,3 @@\n a\n+b\n c\n@@ -9 +10 @@\n-p\n+q\n");

        for direction in [Direction::Stage, Direction::Unstage] {
            let patch = synthesize(&diff, &Selection::new(), direction, "f.txt");
            assert!(patch.is_noop());
            assert_eq!(patch.changed_lines(), 0);
            assert_eq!(
                patch.to_string(),
                "diff --git a/f.txt b/f.txt\n--- a/f.txt\n+++ b/f.txt\n"
            );
        }
    }

    #[test]
    fn header_only_hunk_is_skipped() {
        let diff = FileDiff::parse("@@ -1 +1 @@\n@@ -5 +5 @@\n+x\n");

        for direction in [Direction::Stage, Direction::Unstage] {
            let patch = synthesize(&diff, &Selection::all(&diff), direction, "f.txt");
            assert_eq!(patch.hunks.len(), 1);
            assert_eq!(patch.hunks[0].to_string(), "@@ -5,0 +5,1 @@\n+x\n");
        }
    }

    #[test]
    fn patch_from_empty_diff_is_noop() {
        let patch = synthesize(&FileDiff::default(), &Selection::new(), Direction::Stage, "a");
        assert!(patch.is_noop());
    }

    #[test]
    fn hunk_keeps_original_starts_with_fresh_counts() {
        let diff = FileDiff::parse("@@ -136,3 +136,4 @@ section\n a\n+b\n+c\n d\n-e\n");
        let selection = select(&diff, &[("c", DiffLineKind::Addition)]);

        let patch = synthesize(&diff, &selection, Direction::Stage, "flake.nix");

        assert_eq!(
            patch.hunks[0].to_string(),
            "@@ -136,3 +136,4 @@\n a\n+c\n d\n e\n"
        );
        assert_eq!(patch.changed_lines(), 1);
    }

    #[test]
    fn untracked_file_lines() {
        let raw = crate::diff::untracked_diff("new.txt", "one\ntwo\nthree\n");
        let diff = FileDiff::parse(&raw);
        let selection = select(&diff, &[("two", DiffLineKind::Addition)]);

        let patch = synthesize(&diff, &selection, Direction::Stage, "new.txt");

        assert_eq!(patch.hunks[0].to_string(), "@@ -0,0 +1,1 @@\n+two\n");
    }
}
