use std::fmt;

/// Identity of a parsed line, unique within one [`FileDiff`](super::FileDiff).
///
/// Ids are handed out sequentially by a single parse call. Two parses of the
/// same text produce equal ids for unrelated lines, so an id must never outlive
/// the diff it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(u32);

impl LineId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffLineKind {
    Context,
    Addition,
    Removal,
    /// The `@@ ... @@` line opening a hunk
    Header,
}

impl DiffLineKind {
    /// Marker character used when the line is written back into a patch.
    ///
    /// Headers have no marker; they are regenerated, never copied.
    pub fn marker(self) -> Option<char> {
        match self {
            DiffLineKind::Context => Some(' '),
            DiffLineKind::Addition => Some('+'),
            DiffLineKind::Removal => Some('-'),
            DiffLineKind::Header => None,
        }
    }

    /// Whether a user can pick this kind of line for staging.
    pub fn is_change(self) -> bool {
        matches!(self, DiffLineKind::Addition | DiffLineKind::Removal)
    }
}

/// A single typed line of a parsed hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub id: LineId,
    /// Line number in the old file (context and removals)
    pub old_line: Option<u32>,
    /// Line number in the new file (context and additions)
    pub new_line: Option<u32>,
    pub kind: DiffLineKind,
    /// Text without its leading marker
    pub content: String,
}

impl DiffLine {
    pub fn is_change(&self) -> bool {
        self.kind.is_change()
    }
}
