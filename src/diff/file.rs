use super::hunk::Hunk;
use super::lex::{Line, LineKind};

/// Per-file metadata taken from the lines before the first hunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// New path (`+++ b/…`), empty when the file was deleted
    pub path: String,
    /// Old path (`--- a/…`), empty when the file was created
    pub old_path: String,
    /// `new file mode` / `new mode`
    pub mode: String,
    /// `deleted file mode` / `old mode`
    pub old_mode: String,
}

impl Changes {
    /// Scan header lines for paths and modes.
    ///
    /// Stops at the first line that is not [`LineKind::DiffStart`] or
    /// [`LineKind::Header`], so hunk content can never be mistaken for
    /// metadata.
    pub fn from_header(lines: &[Line]) -> Self {
        let mut changes = Changes::default();

        for line in lines {
            if !matches!(line.kind, LineKind::DiffStart | LineKind::Header) {
                break;
            }

            let text = line.text.as_str();
            if let Some(mode) = text.strip_prefix("old mode ") {
                changes.old_mode = mode.to_string();
            } else if let Some(mode) = text.strip_prefix("deleted file mode ") {
                changes.old_mode = mode.to_string();
            } else if let Some(mode) = text.strip_prefix("new mode ") {
                changes.mode = mode.to_string();
            } else if let Some(mode) = text.strip_prefix("new file mode ") {
                changes.mode = mode.to_string();
            } else if let Some(path) = text.strip_prefix("--- a/") {
                changes.old_path = path.to_string();
            } else if let Some(path) = text.strip_prefix("+++ b/") {
                changes.path = path.to_string();
            } else if let Some(path) = text.strip_prefix("rename from ") {
                changes.old_path = path.to_string();
            } else if let Some(path) = text.strip_prefix("rename to ") {
                changes.path = path.to_string();
            }
        }

        changes
    }
}

/// The diff of one file inside a [`Document`](super::full::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Index of the entry's first line in the document
    pub offset: usize,
    /// Number of lines the entry spans
    pub length: usize,
    pub hunks: Vec<Hunk>,
    pub changes: Changes,
}

impl Entry {
    pub fn line_start(&self) -> usize {
        self.offset
    }

    pub fn line_end(&self) -> usize {
        self.offset + self.length
    }

    /// Whether `index` falls in `[offset, offset + length]`.
    ///
    /// The upper bound is inclusive, so the first line after an entry still
    /// resolves to it when nothing earlier claimed the index.
    pub fn contains_line(&self, index: usize) -> bool {
        (self.line_start()..=self.line_end()).contains(&index)
    }

    pub fn find_hunk(&self, index: usize) -> Option<&Hunk> {
        self.hunks.iter().find(|hunk| hunk.contains_line(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::lex::parse_lines;
    use similar_asserts::assert_eq;

    #[test]
    fn changes_for_modified_file() {
        let lines = parse_lines(
            "diff --git a/change_file.txt b/change_file.txt\nindex 1111111..2222222 100644\n--- a/change_file.txt\n+++ b/change_file.txt\n@@ -1 +1 @@\n-a\n+b\n",
        );
        assert_eq!(
            Changes::from_header(&lines),
            Changes {
                path: "change_file.txt".to_string(),
                old_path: "change_file.txt".to_string(),
                mode: String::new(),
                old_mode: String::new(),
            }
        );
    }

    #[test]
    fn changes_for_new_file_ignore_dev_null() {
        let lines = parse_lines(
            "diff --git a/x b/x\nnew file mode 100644\nindex 0000000..1fa3451\n--- /dev/null\n+++ b/x\n@@ -0,0 +1,1 @@\n+abc\n",
        );
        assert_eq!(
            Changes::from_header(&lines),
            Changes {
                path: "x".to_string(),
                old_path: String::new(),
                mode: "100644".to_string(),
                old_mode: String::new(),
            }
        );
    }

    #[test]
    fn changes_for_deleted_file() {
        let lines = parse_lines(
            "diff --git a/gone.txt b/gone.txt\ndeleted file mode 100755\nindex 1fa3451..0000000\n--- a/gone.txt\n+++ /dev/null\n@@ -1 +0,0 @@\n-abc\n",
        );
        assert_eq!(
            Changes::from_header(&lines),
            Changes {
                path: String::new(),
                old_path: "gone.txt".to_string(),
                mode: String::new(),
                old_mode: "100755".to_string(),
            }
        );
    }

    #[test]
    fn changes_for_mode_change() {
        let lines = parse_lines("diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\n");
        let changes = Changes::from_header(&lines);
        assert_eq!(changes.old_mode, "100644");
        assert_eq!(changes.mode, "100755");
        assert_eq!(changes.path, "");
    }

    #[test]
    fn changes_for_pure_rename() {
        let lines = parse_lines(
            "diff --git a/old.rs b/new.rs\nsimilarity index 100%\nrename from old.rs\nrename to new.rs\n",
        );
        let changes = Changes::from_header(&lines);
        assert_eq!(changes.old_path, "old.rs");
        assert_eq!(changes.path, "new.rs");
    }

    #[test]
    fn changes_stop_at_first_hunk() {
        // a context line that happens to look like metadata must not be read
        let lines = parse_lines(
            "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\nnew mode 100755\n-a\n+b\n",
        );
        assert_eq!(Changes::from_header(&lines).mode, "");
    }

    #[test]
    fn entry_contains_line_includes_upper_bound() {
        let entry = Entry {
            offset: 10,
            length: 5,
            hunks: vec![],
            changes: Changes::default(),
        };
        assert!(!entry.contains_line(9));
        assert!(entry.contains_line(10));
        assert!(entry.contains_line(15));
        assert!(!entry.contains_line(16));
    }
}
