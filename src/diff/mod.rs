pub mod file;
pub mod hunk;
pub mod line;

pub use file::FileDiff;
pub use hunk::{DiffHunk, parse_header};
pub use line::{DiffLine, DiffLineKind, LineId};

/// Build a diff for a file git does not track yet.
///
/// Every line of `contents` becomes an addition in a single `@@ -0,0 +1,N @@`
/// hunk, so the result parses exactly like git's own output for a new file.
/// Empty contents produce headers only.
pub fn untracked_diff(path: &str, contents: &str) -> String {
    let lines: Vec<&str> = contents.lines().collect();

    let mut result = format!("--- /dev/null\n+++ b/{}\n", path);
    if lines.is_empty() {
        return result;
    }

    result.push_str(&format!("@@ -0,0 +1,{} @@\n", lines.len()));
    for line in lines {
        result.push('+');
        result.push_str(line);
        result.push('\n');
    }
    result
}

/// Format a parsed diff for display with explicit line numbers.
///
/// Additions carry their new line number, removals their old one, so every
/// changed line can be referenced for staging (see [`crate::parse`]).
///
/// Example output:
/// ```text
/// flake.nix:
/// @@ -136,2 +136,3 @@
///    136:     inputs = {
///   +137:       debug = true;
///   -137:       debug = false;
/// ```
pub fn format_numbered(diff: &FileDiff) -> String {
    let mut result = String::new();
    if diff.is_empty() {
        return result;
    }

    if !diff.filename.is_empty() {
        result.push_str(&diff.filename);
        result.push_str(":\n");
    }

    for (index, hunk) in diff.hunks.iter().enumerate() {
        // Blank line between hunks
        if index > 0 {
            result.push('\n');
        }

        for line in &hunk.lines {
            match (line.kind, line.old_line, line.new_line) {
                (DiffLineKind::Header, _, _) => {
                    result.push_str(&line.content);
                    result.push('\n');
                }
                (DiffLineKind::Addition, _, Some(new_line)) => {
                    result.push_str(&format!("  +{}:\t{}\n", new_line, line.content));
                }
                (DiffLineKind::Removal, Some(old_line), _) => {
                    result.push_str(&format!("  -{}:\t{}\n", old_line, line.content));
                }
                (DiffLineKind::Context, _, Some(new_line)) => {
                    result.push_str(&format!("   {}:\t{}\n", new_line, line.content));
                }
                _ => {}
            }
        }
    }

    result
}
