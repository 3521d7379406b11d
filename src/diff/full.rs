use super::file::{Changes, Entry};
use super::hunk::{Hunk, HunkHeader};
use super::lex::{Line, LineKind, lex, parse_lines};
use std::fmt;

/// Every line of one or more single-file diffs, addressable by index.
///
/// Entries and hunks hold absolute indices into `lines`, so they are only
/// meaningful together with the document that produced them. A document is
/// never edited: re-read the diff and build a new one instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub lines: Vec<Line>,
    pub entries: Vec<Entry>,
}

impl Document {
    /// Build a document from per-file diff texts, in order.
    pub fn parse<S: AsRef<str>>(file_diffs: &[S]) -> Self {
        let mut doc = Document::default();

        for text in file_diffs {
            let file_lines = parse_lines(text.as_ref());
            let entry_offset = doc.lines.len();
            let entry_length = file_lines.len();

            let hunks = hunk_starts(&file_lines)
                .zip(
                    hunk_starts(&file_lines)
                        .skip(1)
                        .chain(std::iter::once(entry_length)),
                )
                .filter_map(|(start, end)| {
                    let header = HunkHeader::parse(&file_lines[start].text)?;
                    Some(Hunk {
                        offset: entry_offset + start,
                        length: end - start,
                        old_start: header.old_start,
                        old_length: header.old_length,
                        new_start: header.new_start,
                        new_length: header.new_length,
                    })
                })
                .collect();

            let changes = Changes::from_header(&file_lines);
            doc.lines.extend(file_lines);
            doc.entries.push(Entry {
                offset: entry_offset,
                length: entry_length,
                hunks,
                changes,
            });
        }

        doc
    }

    /// The entry whose `[offset, offset + length]` holds `index`.
    pub fn find_entry(&self, index: usize) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.contains_line(index))
    }

    /// The hunk holding `index`, looked up through its entry.
    pub fn find_hunk(&self, index: usize) -> Option<&Hunk> {
        self.find_entry(index)?.find_hunk(index)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Positions of every `@@` line within one file's lines.
fn hunk_starts(lines: &[Line]) -> impl Iterator<Item = usize> + '_ {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.kind == LineKind::HunkStart)
        .map(|(i, _)| i)
}

/// Listing with each line prefixed by its document index.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.lines.len().saturating_sub(1).to_string().len();
        for (i, line) in self.lines.iter().enumerate() {
            writeln!(f, "{i:>width$}: {line}")?;
        }
        Ok(())
    }
}

/// Cut the output of a multi-file `git diff` into one text per file.
///
/// Every `diff --git ` line starts a new file. Terminators are kept as they
/// were, so concatenating the pieces gives back `text`. Anything before the
/// first `diff --git ` line is dropped.
pub fn split_files(text: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();

    for (line, line_break) in lex(text) {
        if line.starts_with("diff --git ") {
            files.push(String::new());
        }
        if let Some(current) = files.last_mut() {
            current.push_str(line);
            current.push_str(line_break.as_str());
        }
    }

    files
}
