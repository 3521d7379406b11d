//! Splitting raw diff text into typed lines.
//!
//! [`lex`] cuts text into physical lines while remembering each line's exact
//! terminator, so that joining `text + line_break` reproduces the input byte
//! for byte. [`classify`] then tags every line with a [`LineKind`] using the
//! same prefix rules git's own output follows.

use std::fmt;

/// The terminator observed at the end of a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineBreak {
    /// Last line of the text, no terminator
    #[default]
    None,
    /// `\n`
    Lf,
    /// `\r`
    Cr,
    /// `\r\n`
    CrLf,
}

impl LineBreak {
    pub fn as_str(self) -> &'static str {
        match self {
            LineBreak::None => "",
            LineBreak::Lf => "\n",
            LineBreak::Cr => "\r",
            LineBreak::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic role of a line within a single-file diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// `diff --git a/... b/...`
    DiffStart,
    /// Any other metadata before the first hunk (index, modes, renames, `---`/`+++`)
    Header,
    /// `@@ -a,b +c,d @@`
    HunkStart,
    Context,
    Addition,
    Removal,
    /// `\ No newline at end of file`
    NoNewlineMarker,
}

impl LineKind {
    /// Only these kinds can be picked for a synthesized patch.
    pub fn is_addition_or_removal(self) -> bool {
        matches!(self, LineKind::Addition | LineKind::Removal)
    }

    fn label(self) -> &'static str {
        match self {
            LineKind::DiffStart => "diff",
            LineKind::Header => "header",
            LineKind::HunkStart => "hunk",
            LineKind::Context => "context",
            LineKind::Addition => "addition",
            LineKind::Removal => "removal",
            LineKind::NoNewlineMarker => "no-newline",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One physical line of diff text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    /// Content without its terminator
    pub text: String,
    pub line_break: LineBreak,
}

impl Line {
    /// Write the line exactly as it appeared in the source text.
    pub fn write_raw(&self, out: &mut String) {
        out.push_str(&self.text);
        out.push_str(self.line_break.as_str());
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:<10}] {}", self.kind, self.text)
    }
}

/// Split `content` into `(text, line_break)` pairs.
///
/// `\n`, `\r` and `\r\n` are each recognised as a terminator. A trailing
/// fragment without a terminator becomes a final line with
/// [`LineBreak::None`]; text ending exactly on a terminator yields no extra
/// empty line.
pub fn lex(content: &str) -> Vec<(&str, LineBreak)> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let line_break = match c {
            '\n' => LineBreak::Lf,
            '\r' if chars.peek().is_some_and(|&(_, next)| next == '\n') => {
                chars.next();
                LineBreak::CrLf
            }
            '\r' => LineBreak::Cr,
            _ => continue,
        };

        lines.push((&content[line_start..i], line_break));
        line_start = i + line_break.as_str().len();
    }

    if line_start < content.len() {
        lines.push((&content[line_start..], LineBreak::None));
    }

    lines
}

/// Tag lexed lines with their [`LineKind`].
///
/// Everything before the first `@@` line is metadata: the `diff --git` line
/// becomes [`LineKind::DiffStart`], the rest [`LineKind::Header`]. From the
/// first `@@` line onwards only the leading character matters.
pub fn classify(lines: &[(&str, LineBreak)]) -> Vec<Line> {
    let mut in_hunks = false;

    lines
        .iter()
        .map(|&(text, line_break)| {
            if text.starts_with("@@") {
                in_hunks = true;
            }

            let kind = if !in_hunks {
                if text.starts_with("diff --git") {
                    LineKind::DiffStart
                } else {
                    LineKind::Header
                }
            } else if text.starts_with("@@") {
                LineKind::HunkStart
            } else if text.starts_with('+') {
                LineKind::Addition
            } else if text.starts_with('-') {
                LineKind::Removal
            } else if text.starts_with('\\') {
                LineKind::NoNewlineMarker
            } else {
                LineKind::Context
            };

            Line {
                kind,
                text: text.to_string(),
                line_break,
            }
        })
        .collect()
}

/// Lex and classify a single-file diff in one step.
pub fn parse_lines(content: &str) -> Vec<Line> {
    classify(&lex(content))
}
