use super::hunk::{DiffHunk, parse_header};
use super::line::{DiffLine, DiffLineKind, LineId};

/// A parsed diff for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDiff {
    /// Path from the `+++ b/path` header; empty when the diff has none
    pub filename: String,
    /// Empty when there is no textual change (mode-only or binary diffs)
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    /// Parse one file's `git diff` output.
    ///
    /// Never fails: lines that are not part of the unified diff grammar are
    /// skipped, and unreadable hunk headers start counting at line 1. Line
    /// numbers are recomputed from each header rather than trusted from its
    /// counts.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut parser = Parser::default();
        for line in text.split('\n') {
            parser.feed(line);
        }
        parser.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Every line of every hunk, headers included, in display order.
    pub fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks.iter().flat_map(|hunk| hunk.lines.iter())
    }

    /// Look up a line by its identity.
    pub fn line(&self, id: LineId) -> Option<&DiffLine> {
        self.lines().find(|line| line.id == id)
    }
}

#[derive(Default)]
struct Parser {
    filename: String,
    hunks: Vec<DiffHunk>,
    current: Option<DiffHunk>,
    next_id: u32,
    old_line: u32,
    new_line: u32,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if let Some(path) = line.strip_prefix("+++ b/") {
            self.filename = path.to_string();
            return;
        }
        if ["--- ", "+++ ", "diff ", "index "]
            .iter()
            .any(|prefix| line.starts_with(prefix))
        {
            return;
        }

        if line.starts_with("@@") {
            self.start_hunk(line);
        } else if let Some(content) = line.strip_prefix('+') {
            let new_line = self.new_line;
            self.new_line = self.new_line.saturating_add(1);
            self.push(DiffLineKind::Addition, None, Some(new_line), content);
        } else if let Some(content) = line.strip_prefix('-') {
            let old_line = self.old_line;
            self.old_line = self.old_line.saturating_add(1);
            self.push(DiffLineKind::Removal, Some(old_line), None, content);
        } else if let Some(content) = line.strip_prefix(' ') {
            self.push_context(content);
        } else if self.current.is_some() && !line.is_empty() && !line.starts_with('\\') {
            // Some tools strip the leading space from blank-ish context lines.
            self.push_context(line);
        }
        // Everything else: "\ No newline at end of file", mode lines, binary notices
    }

    fn start_hunk(&mut self, header: &str) {
        self.flush();

        let (old_start, new_start) = parse_header(header);
        self.old_line = old_start;
        self.new_line = new_start;

        let id = self.allocate_id();
        self.current = Some(DiffHunk {
            header: header.to_string(),
            lines: vec![DiffLine {
                id,
                old_line: None,
                new_line: None,
                kind: DiffLineKind::Header,
                content: header.to_string(),
            }],
        });
    }

    fn push_context(&mut self, content: &str) {
        let (old_line, new_line) = (self.old_line, self.new_line);
        self.old_line = self.old_line.saturating_add(1);
        self.new_line = self.new_line.saturating_add(1);
        self.push(
            DiffLineKind::Context,
            Some(old_line),
            Some(new_line),
            content,
        );
    }

    fn push(
        &mut self,
        kind: DiffLineKind,
        old_line: Option<u32>,
        new_line: Option<u32>,
        content: &str,
    ) {
        // Markers before the first header belong to no hunk.
        if self.current.is_none() {
            return;
        }
        let id = self.allocate_id();
        if let Some(hunk) = self.current.as_mut() {
            hunk.lines.push(DiffLine {
                id,
                old_line,
                new_line,
                kind,
                content: content.to_string(),
            });
        }
    }

    fn allocate_id(&mut self) -> LineId {
        let id = LineId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn flush(&mut self) {
        if let Some(hunk) = self.current.take() {
            self.hunks.push(hunk);
        }
    }

    fn finish(mut self) -> FileDiff {
        self.flush();
        FileDiff {
            filename: self.filename,
            hunks: self.hunks,
        }
    }
}
