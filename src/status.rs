//! Parsing of `git status --porcelain=v1` output into staged and unstaged
//! change lists.
//!
//! Each status line is `XY path`: `X` describes the index, `Y` the work tree.
//!
//! ```
//! use line_stager::status::{ChangeStatus, parse_status};
//!
//! let lists = parse_status("M  src/lib.rs\n?? notes.txt\n");
//! assert_eq!(lists.staged[0].status, ChangeStatus::Modified);
//! assert_eq!(lists.unstaged[0].status, ChangeStatus::Untracked);
//! ```

use std::fmt;

/// How a path differs on one side of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Modified,
    Added,
    Deleted,
    Conflicted,
    Untracked,
    Renamed,
}

impl ChangeStatus {
    /// One-letter code shown next to a path
    pub fn code(self) -> char {
        match self {
            ChangeStatus::Modified => 'M',
            ChangeStatus::Added => 'A',
            ChangeStatus::Deleted => 'D',
            ChangeStatus::Conflicted => 'C',
            ChangeStatus::Untracked => '?',
            ChangeStatus::Renamed => 'R',
        }
    }

    /// Staged-side status for an index column code.
    fn from_index_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(ChangeStatus::Modified),
            'A' => Some(ChangeStatus::Added),
            'D' => Some(ChangeStatus::Deleted),
            'R' => Some(ChangeStatus::Renamed),
            'U' => Some(ChangeStatus::Conflicted),
            _ => None,
        }
    }

    /// Unstaged-side status for a work tree column code.
    ///
    /// Only `AA` (both added) is treated as a conflict beyond the plain `U`.
    fn from_work_tree_code(code: char, index_code: char) -> Option<Self> {
        match (index_code, code) {
            (_, '?') => Some(ChangeStatus::Untracked),
            (_, 'M') => Some(ChangeStatus::Modified),
            (_, 'D') => Some(ChangeStatus::Deleted),
            (_, 'U') => Some(ChangeStatus::Conflicted),
            ('A', 'A') => Some(ChangeStatus::Conflicted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A changed path together with its status on one side of the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }

    /// Last path component.
    pub fn filename(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map_or(self.path.as_str(), |(_, name)| name)
    }

    /// Parent directory with a trailing `/`, or empty at the repository root.
    pub fn directory(&self) -> &str {
        self.path
            .rfind('/')
            .map_or("", |slash| &self.path[..=slash])
    }
}

/// Result of one status scan. Both lists are sorted by path, ignoring case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLists {
    pub staged: Vec<FileChange>,
    pub unstaged: Vec<FileChange>,
}

impl StatusLists {
    /// Whether `path` appears in either list.
    pub fn contains(&self, path: &str) -> bool {
        self.staged
            .iter()
            .chain(&self.unstaged)
            .any(|change| change.path == path)
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }
}

/// Parse porcelain v1 short status output.
///
/// Never fails: lines shorter than three characters and unknown status codes
/// are skipped. Untracked paths only ever land in `unstaged`.
pub fn parse_status(output: &str) -> StatusLists {
    let mut lists = StatusLists::default();

    for line in output.split('\n') {
        let mut chars = line.chars();
        let (Some(index_code), Some(work_tree_code), Some(_)) =
            (chars.next(), chars.next(), chars.next())
        else {
            continue;
        };
        let path = chars.as_str();

        if work_tree_code == '?' {
            lists
                .unstaged
                .push(FileChange::new(path, ChangeStatus::Untracked));
            continue;
        }

        if let Some(status) = ChangeStatus::from_index_code(index_code) {
            lists.staged.push(FileChange::new(path, status));
        }
        if let Some(status) = ChangeStatus::from_work_tree_code(work_tree_code, index_code) {
            lists.unstaged.push(FileChange::new(path, status));
        }
    }

    sort_by_path(&mut lists.staged);
    sort_by_path(&mut lists.unstaged);
    lists
}

fn sort_by_path(changes: &mut [FileChange]) {
    changes.sort_by_cached_key(|change| change.path.to_lowercase());
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn change(path: &str, status: ChangeStatus) -> FileChange {
        FileChange::new(path, status)
    }

    #[test]
    fn parse_mixed_status() {
        let lists = parse_status("M  foo.txt\n?? bar.txt\nA  baz.txt\n");
        assert_eq!(
            lists.staged,
            vec![
                change("baz.txt", ChangeStatus::Added),
                change("foo.txt", ChangeStatus::Modified),
            ]
        );
        assert_eq!(lists.unstaged, vec![change("bar.txt", ChangeStatus::Untracked)]);
    }

    #[test]
    fn parse_intent_to_add_contributes_nothing() {
        // " A" has no staged code and "A" alone is not a work tree code.
        let lists = parse_status(" A baz.txt\n");
        assert!(lists.is_empty());
    }

    #[test]
    fn parse_both_sides_modified() {
        let lists = parse_status("MM src/main.rs\n");
        assert_eq!(lists.staged, vec![change("src/main.rs", ChangeStatus::Modified)]);
        assert_eq!(lists.unstaged, vec![change("src/main.rs", ChangeStatus::Modified)]);
    }

    #[test]
    fn parse_work_tree_only() {
        let lists = parse_status(" M a.txt\n D b.txt\n");
        assert!(lists.staged.is_empty());
        assert_eq!(
            lists.unstaged,
            vec![
                change("a.txt", ChangeStatus::Modified),
                change("b.txt", ChangeStatus::Deleted),
            ]
        );
    }

    #[test]
    fn parse_conflicts() {
        let lists = parse_status("UU both.txt\nAA added.txt\nDD gone.txt\n");
        assert_eq!(
            lists.staged,
            vec![
                change("added.txt", ChangeStatus::Added),
                change("both.txt", ChangeStatus::Conflicted),
                change("gone.txt", ChangeStatus::Deleted),
            ]
        );
        // Only UU and AA are conflicts on the work tree side; DD is not mapped.
        assert_eq!(
            lists.unstaged,
            vec![
                change("added.txt", ChangeStatus::Conflicted),
                change("both.txt", ChangeStatus::Conflicted),
                change("gone.txt", ChangeStatus::Deleted),
            ]
        );
    }

    #[test]
    fn parse_rename_keeps_raw_path() {
        let lists = parse_status("R  old.txt -> new.txt\n");
        assert_eq!(
            lists.staged,
            vec![change("old.txt -> new.txt", ChangeStatus::Renamed)]
        );
        assert!(lists.unstaged.is_empty());
    }

    #[test]
    fn parse_untracked_never_staged() {
        let lists = parse_status("A? odd.txt\n");
        assert!(lists.staged.is_empty());
        assert_eq!(lists.unstaged, vec![change("odd.txt", ChangeStatus::Untracked)]);
    }

    #[test]
    fn parse_unknown_codes_are_skipped() {
        let lists = parse_status("!! ignored.txt\nXY weird.txt\n");
        assert!(lists.is_empty());
    }

    #[test]
    fn parse_skips_short_lines() {
        let lists = parse_status("\nM\nM \n\n");
        assert!(lists.is_empty());
    }

    #[test]
    fn parse_sorts_case_insensitively() {
        let lists = parse_status("M  beta.txt\nM  Alpha.txt\nM  gamma.txt\nM  ALPHA2.txt\n");
        let paths: Vec<_> = lists.staged.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["Alpha.txt", "ALPHA2.txt", "beta.txt", "gamma.txt"]);
    }

    #[test]
    fn contains_checks_both_lists() {
        let lists = parse_status("M  staged.txt\n?? loose.txt\n");
        assert!(lists.contains("staged.txt"));
        assert!(lists.contains("loose.txt"));
        assert!(!lists.contains("other.txt"));
    }

    #[test]
    fn derived_path_parts() {
        let nested = change("src/diff/file.rs", ChangeStatus::Modified);
        assert_eq!(nested.filename(), "file.rs");
        assert_eq!(nested.directory(), "src/diff/");

        let top = change("Cargo.toml", ChangeStatus::Modified);
        assert_eq!(top.filename(), "Cargo.toml");
        assert_eq!(top.directory(), "");
    }

    #[test]
    fn status_codes() {
        let codes: String = [
            ChangeStatus::Modified,
            ChangeStatus::Added,
            ChangeStatus::Deleted,
            ChangeStatus::Conflicted,
            ChangeStatus::Untracked,
            ChangeStatus::Renamed,
        ]
        .iter()
        .map(|status| status.code())
        .collect();
        assert_eq!(codes, "MADC?R");
    }
}
