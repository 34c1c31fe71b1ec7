//! Line references for selecting diff lines from the command line.
//!
//! Input looks like `src/app.rs:10,15,-20`: a path, a colon, then a
//! comma-separated list of references.
//!
//! - `N` - addition at new line N
//! - `-N` - removal of old line N
//! - `N..M` - additions N through M
//! - `-N..-M` - removals N through M
//!
//! ```
//! use line_stager::parse::{LineRef, parse_file_refs};
//! use std::num::NonZeroU32;
//!
//! let refs = parse_file_refs("config.nix:-10,12..13").unwrap();
//! assert_eq!(refs.file, "config.nix");
//! assert_eq!(refs.refs, vec![
//!     LineRef::Delete(NonZeroU32::new(10).unwrap()),
//!     LineRef::AddRange(NonZeroU32::new(12).unwrap(), NonZeroU32::new(13).unwrap()),
//! ]);
//! ```

use crate::diff::{DiffLine, DiffLineKind};
use error_set::error_set;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as number},
    combinator::{all_consuming, opt},
    sequence::preceded,
};
use std::num::NonZeroU32;

error_set! {
    /// Errors from parsing `file:refs` syntax
    ParseError := {
        /// Input has no colon separating the path from the references
        #[display("Invalid format '{input}': expected 'file:refs'")]
        InvalidFormat { input: String },
        #[display("Invalid format '{input}': file name cannot be empty")]
        EmptyFileName { input: String },
        #[display("No line references provided")]
        EmptyRefs,
        /// Not a number, zero, or too large for a line number
        #[display("Invalid line number '{value}'")]
        InvalidLineNumber { value: String },
        #[display("Invalid range {start}..{end}: start must be <= end")]
        InvalidRange { start: u32, end: u32 },
        /// Range like `-3..5` that starts as removals and ends as additions
        #[display("Range '{value}' mixes additions and removals")]
        MixedRange { value: String },
    }
}

/// A reference to lines of a diff.
///
/// Additions are addressed by their new line number, removals by their old one.
#[derive(Debug, Clone, PartialEq)]
pub enum LineRef {
    Add(NonZeroU32),
    /// Inclusive
    AddRange(NonZeroU32, NonZeroU32),
    Delete(NonZeroU32),
    /// Inclusive
    DeleteRange(NonZeroU32, NonZeroU32),
}

impl LineRef {
    /// Whether this reference picks `line`.
    pub fn matches(&self, line: &DiffLine) -> bool {
        let within = |number: Option<u32>, start: &NonZeroU32, end: &NonZeroU32| {
            number.is_some_and(|n| (start.get()..=end.get()).contains(&n))
        };

        match (self, line.kind) {
            (LineRef::Add(n), DiffLineKind::Addition) => line.new_line == Some(n.get()),
            (LineRef::AddRange(start, end), DiffLineKind::Addition) => {
                within(line.new_line, start, end)
            }
            (LineRef::Delete(n), DiffLineKind::Removal) => line.old_line == Some(n.get()),
            (LineRef::DeleteRange(start, end), DiffLineKind::Removal) => {
                within(line.old_line, start, end)
            }
            _ => false,
        }
    }
}

/// A path with the line references to apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLineRefs {
    pub file: String,
    pub refs: Vec<LineRef>,
}

/// Parse a `file:refs` string.
///
/// The path ends at the last colon, so paths containing colons still work.
///
/// # Errors
///
/// Returns [`ParseError`] when the colon, the path or the references are
/// missing, or when a reference is malformed.
pub fn parse_file_refs(input: &str) -> Result<FileLineRefs, ParseError> {
    let Some((file, refs)) = input.rsplit_once(':') else {
        return Err(ParseError::InvalidFormat {
            input: input.to_string(),
        });
    };

    let file = file.trim();
    if file.is_empty() {
        return Err(ParseError::EmptyFileName {
            input: input.to_string(),
        });
    }

    let refs = refs
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_single_ref)
        .collect::<Result<Vec<_>, _>>()?;

    if refs.is_empty() {
        return Err(ParseError::EmptyRefs);
    }

    Ok(FileLineRefs {
        file: file.to_string(),
        refs,
    })
}

/// `(is_removal, line)`
type Endpoint = (bool, u32);

fn endpoint(input: &str) -> IResult<&str, Endpoint> {
    (opt(char('-')).map(|sign| sign.is_some()), number).parse(input)
}

fn single_ref(input: &str) -> IResult<&str, (Endpoint, Option<Endpoint>)> {
    all_consuming((endpoint, opt(preceded(tag(".."), endpoint)))).parse(input)
}

fn parse_single_ref(input: &str) -> Result<LineRef, ParseError> {
    let invalid = || ParseError::InvalidLineNumber {
        value: input.to_string(),
    };

    let (_, ((removal, start), end)) = single_ref(input).map_err(|_| invalid())?;
    let start = NonZeroU32::new(start).ok_or_else(invalid)?;

    let Some((end_removal, end)) = end else {
        return Ok(if removal {
            LineRef::Delete(start)
        } else {
            LineRef::Add(start)
        });
    };

    let end = NonZeroU32::new(end).ok_or_else(invalid)?;
    if removal != end_removal {
        return Err(ParseError::MixedRange {
            value: input.to_string(),
        });
    }
    if start > end {
        return Err(ParseError::InvalidRange {
            start: start.get(),
            end: end.get(),
        });
    }

    Ok(if removal {
        LineRef::DeleteRange(start, end)
    } else {
        LineRef::AddRange(start, end)
    })
}
