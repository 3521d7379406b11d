//! Parsing of line selections into structured references.
//!
//! Lines are addressed by the index `git-istage show` prints in front of
//! them. A selection is a comma-separated list of single indices and
//! inclusive ranges.
//!
//! # Syntax
//!
//! - `N` - the line at index N
//! - `N..M` - every line from N to M (inclusive)
//!
//! # Examples
//!
//! ```
//! use git_istage::parse::{parse_selection, LineRef};
//!
//! let refs = parse_selection("12").unwrap();
//! assert_eq!(refs, vec![LineRef::Line(12)]);
//!
//! let refs = parse_selection("7..9,15").unwrap();
//! assert_eq!(refs, vec![LineRef::Range(7, 9), LineRef::Line(15)]);
//! ```

use error_set::error_set;

error_set! {
    /// Errors from parsing line selections
    ParseError := {
        /// No line references provided
        #[display("No line references provided")]
        EmptySelection,
        /// Index could not be parsed as a non-negative integer
        #[display("Invalid line index '{value}'")]
        InvalidIndex { value: String },
        /// Range has start greater than end
        #[display("Invalid range {start}..{end}: start must be <= end")]
        InvalidRange { start: usize, end: usize },
    }
}

/// A reference to one or more document lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRef {
    Line(usize),
    /// Inclusive start and end
    Range(usize, usize),
}

impl LineRef {
    pub fn indices(self) -> std::ops::RangeInclusive<usize> {
        match self {
            LineRef::Line(n) => n..=n,
            LineRef::Range(start, end) => start..=end,
        }
    }
}

/// Parse a selection string such as `3,7..9`.
///
/// Whitespace around each reference is ignored, as are empty items between
/// commas.
///
/// # Errors
///
/// Returns [`ParseError`] if:
/// - No references are present
/// - An index is not a non-negative integer
/// - A range runs backwards
pub fn parse_selection(input: &str) -> Result<Vec<LineRef>, ParseError> {
    let refs: Vec<LineRef> = input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_single_ref)
        .collect::<Result<_, _>>()?;

    if refs.is_empty() {
        return Err(ParseError::EmptySelection);
    }

    Ok(refs)
}

/// Parse every selection argument into one list of references.
///
/// Ranges stay unexpanded; they are only checked against a document's
/// length once one is read.
pub fn parse_selections<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<LineRef>, ParseError> {
    let mut refs = Vec::new();
    for input in inputs {
        refs.extend(parse_selection(input.as_ref())?);
    }

    if refs.is_empty() {
        return Err(ParseError::EmptySelection);
    }

    Ok(refs)
}

fn parse_single_ref(input: &str) -> Result<LineRef, ParseError> {
    let Some((start, end)) = input.split_once("..") else {
        return Ok(LineRef::Line(parse_index(input)?));
    };

    let start = parse_index(start)?;
    let end = parse_index(end)?;
    if start > end {
        return Err(ParseError::InvalidRange { start, end });
    }

    Ok(LineRef::Range(start, end))
}

fn parse_index(input: &str) -> Result<usize, ParseError> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidIndex {
            value: input.to_string(),
        })
}
