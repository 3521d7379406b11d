//! Synthesizing a patch from a subset of a document's changed lines.
//!
//! Given a [`Document`] and the indices of the additions/removals a user
//! picked, [`compute`] writes a new unified diff that touches only those
//! lines. Everything that was not picked is either turned back into context
//! or left out, depending on the [`Direction`] the patch will be applied in.

use crate::diff::{Document, Entry, Hunk, Line, LineKind};
use crate::parse::LineRef;
use error_set::error_set;
use std::collections::{BTreeMap, BTreeSet};

error_set! {
    /// Errors from resolving a selection and building a patch
    PatchError := {
        /// A selected index is not covered by any entry of the document
        #[display("No diff entry contains line index {index}")]
        EntryNotFound { index: usize },
        /// A user-supplied index lies past the end of the document
        #[display("Line index {index} is out of range: the diff has {len} lines")]
        IndexOutOfRange { index: usize, len: usize },
        /// Nothing left to apply once non-change lines are filtered out
        #[display("No added or removed lines selected")]
        NothingSelected,
    }
}

/// Where a synthesized patch is going to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Forward onto the index
    Stage,
    /// In reverse onto the index
    Unstage,
    /// In reverse onto the worktree
    Reset,
}

impl Direction {
    /// Unstage and Reset take changes away from their target.
    pub fn is_undo(self) -> bool {
        matches!(self, Direction::Unstage | Direction::Reset)
    }
}

/// Resolve user-picked line references into the lines a patch can be built
/// from.
///
/// Every reference is checked against the document before it is expanded.
/// With `whole_hunks`, each index stands for every addition and removal of
/// the hunk it falls in. Lines that are neither additions nor removals are
/// dropped. The result is sorted and free of duplicates.
///
/// # Errors
///
/// - [`PatchError::IndexOutOfRange`] if a reference reaches past the end of `doc`
/// - [`PatchError::NothingSelected`] if no addition or removal remains
pub fn select_lines(
    doc: &Document,
    refs: &[LineRef],
    whole_hunks: bool,
) -> Result<Vec<usize>, PatchError> {
    let len = doc.lines.len();
    if let Some(index) = refs
        .iter()
        .map(|line_ref| *line_ref.indices().end())
        .find(|&end| end >= len)
    {
        return Err(PatchError::IndexOutOfRange { index, len });
    }

    let mut selected = BTreeSet::new();
    for index in refs.iter().flat_map(|line_ref| line_ref.indices()) {
        match doc.find_hunk(index).filter(|_| whole_hunks) {
            Some(hunk) => selected.extend(hunk.line_start()..hunk.line_end()),
            None => {
                selected.insert(index);
            }
        }
    }

    let selected: Vec<usize> = selected
        .into_iter()
        .filter(|&i| doc.lines[i].kind.is_addition_or_removal())
        .collect();

    if selected.is_empty() {
        return Err(PatchError::NothingSelected);
    }

    Ok(selected)
}

/// Selected lines that fall inside one hunk
struct HunkSelection<'a> {
    entry: &'a Entry,
    hunk: &'a Hunk,
    lines: BTreeSet<usize>,
}

/// Build a patch containing only the `selected` addition/removal lines.
///
/// One `---`/`+++`/`@@` block is written per touched hunk, in document
/// order. Indices that fall in an entry but outside every hunk are ignored.
/// An empty selection gives an empty patch.
///
/// # Errors
///
/// Returns [`PatchError::EntryNotFound`] if an index is not covered by any
/// entry of `doc`.
pub fn compute(
    doc: &Document,
    selected: &[usize],
    direction: Direction,
) -> Result<String, PatchError> {
    // keyed by hunk offset so output order follows the document
    let mut by_hunk: BTreeMap<usize, HunkSelection<'_>> = BTreeMap::new();

    for &index in selected {
        let entry = doc
            .find_entry(index)
            .ok_or(PatchError::EntryNotFound { index })?;
        let Some(hunk) = entry.find_hunk(index) else {
            continue;
        };

        by_hunk
            .entry(hunk.offset)
            .or_insert_with(|| HunkSelection {
                entry,
                hunk,
                lines: BTreeSet::new(),
            })
            .lines
            .insert(index);
    }

    let mut patch = String::new();
    for selection in by_hunk.values() {
        write_hunk(&mut patch, doc, selection, direction);
    }

    Ok(patch)
}

/// Whether an original line still exists on the old side of the new patch.
///
/// Context always does. Going forward every removal does, since the old side
/// is the target as it is now. Undoing, an unpicked removal was never applied
/// to the target and an unpicked addition is still in it.
pub(crate) fn present_on_old_side(kind: LineKind, selected: bool, direction: Direction) -> bool {
    match kind {
        LineKind::Context => true,
        LineKind::Removal => !direction.is_undo() || selected,
        LineKind::Addition => direction.is_undo() && !selected,
        _ => false,
    }
}

/// Whether an unpicked line must be kept as context.
fn becomes_context(kind: LineKind, direction: Direction) -> bool {
    match kind {
        LineKind::Removal => !direction.is_undo(),
        LineKind::Addition => direction.is_undo(),
        _ => false,
    }
}

fn write_hunk(
    patch: &mut String,
    doc: &Document,
    selection: &HunkSelection<'_>,
    direction: Direction,
) {
    let HunkSelection { entry, hunk, lines } = selection;
    let body = doc
        .lines
        .get(hunk.line_start()..hunk.line_end())
        .unwrap_or_default();
    let numbered = || body.iter().zip(hunk.line_start()..);

    let old_length = numbered()
        .filter(|(line, i)| present_on_old_side(line.kind, lines.contains(i), direction))
        .count();
    let added = lines
        .iter()
        .filter(|&&i| doc.lines[i].kind == LineKind::Addition)
        .count();
    let removed = lines
        .iter()
        .filter(|&&i| doc.lines[i].kind == LineKind::Removal)
        .count();
    let new_length = (old_length + added).saturating_sub(removed);

    let changes = &entry.changes;
    let old_exists =
        old_length != 0 || !changes.old_mode.is_empty() || !changes.old_path.is_empty();
    let old_path = non_empty_or(&changes.old_path, &changes.path);
    let path = non_empty_or(&changes.path, &changes.old_path);

    if old_exists {
        patch.push_str(&format!("--- a/{}\n", old_path));
    } else {
        patch.push_str(&format!("new file mode {}\n", changes.mode));
        patch.push_str("--- /dev/null\n");
    }
    patch.push_str(&format!("+++ b/{}\n", path));
    patch.push_str(&format!(
        "@@ -{} +{} @@\n",
        format_range(hunk.old_start, old_length),
        format_range(hunk.new_start, new_length)
    ));

    let mut previous_emitted = false;
    for (line, i) in numbered() {
        previous_emitted = if lines.contains(&i)
            || line.kind == LineKind::Context
            || (previous_emitted && line.kind == LineKind::NoNewlineMarker)
        {
            line.write_raw(patch);
            true
        } else if becomes_context(line.kind, direction) {
            write_as_context(patch, line);
            true
        } else {
            false
        };
    }
}

/// Replace the leading `+`/`-` with a space.
fn write_as_context(patch: &mut String, line: &Line) {
    patch.push(' ');
    patch.push_str(line.text.get(1..).unwrap_or_default());
    patch.push_str(line.line_break.as_str());
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// `start` alone when the range is one line long, `start,length` otherwise
fn format_range(start: u32, length: usize) -> String {
    if length == 1 {
        start.to_string()
    } else {
        format!("{},{}", start, length)
    }
}
