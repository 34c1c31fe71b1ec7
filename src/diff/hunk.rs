use super::line::{DiffLine, DiffLineKind};
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{digit1, u32 as number},
    combinator::opt,
    sequence::{preceded, terminated},
};

/// Start lines used when a hunk header cannot be read
pub const FALLBACK_STARTS: (u32, u32) = (1, 1);

/// A single hunk of a parsed diff.
///
/// `lines[0]` is always the [`DiffLineKind::Header`] line carrying the raw
/// header text; the body follows in diff order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    /// Original `@@ ... @@` text, including any trailing section heading
    pub header: String,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Old and new start lines declared by the header.
    pub fn starts(&self) -> (u32, u32) {
        parse_header(&self.header)
    }

    /// Lines after the header.
    pub fn body(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines
            .iter()
            .filter(|line| line.kind != DiffLineKind::Header)
    }

    /// Old and new line counts implied by the body.
    ///
    /// These are derived from the parsed lines, not read from the header.
    pub fn counts(&self) -> (u32, u32) {
        self.body().fold((0, 0), |(old, new), line| match line.kind {
            DiffLineKind::Context => (old + 1, new + 1),
            DiffLineKind::Removal => (old + 1, new),
            DiffLineKind::Addition => (old, new + 1),
            DiffLineKind::Header => (old, new),
        })
    }
}

/// Parse a hunk header into its old and new start lines.
///
/// Format: `@@ -old_start[,old_count] +new_start[,new_count] @@ optional context`.
/// The first well-formed occurrence wins; counts are skipped because they are
/// recomputed whenever a patch is written. Unreadable headers yield
/// [`FALLBACK_STARTS`].
pub fn parse_header(header: &str) -> (u32, u32) {
    header
        .match_indices("@@ -")
        .find_map(|(at, _)| header_starts(&header[at..]).ok())
        .map(|(_, starts)| starts)
        .unwrap_or(FALLBACK_STARTS)
}

fn header_starts(input: &str) -> IResult<&str, (u32, u32)> {
    (tag("@@ -"), range_start, tag(" +"), range_start, tag(" @@"))
        .map(|(_, old_start, _, new_start, _)| (old_start, new_start))
        .parse(input)
}

/// `136,0` or `137`
fn range_start(input: &str) -> IResult<&str, u32> {
    terminated(number, opt(preceded(tag(","), digit1))).parse(input)
}
