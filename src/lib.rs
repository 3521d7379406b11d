use error_set::error_set;
use log::{debug, trace, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub mod diff;
pub mod parse;
pub mod patch;

pub use diff::Document;
pub use parse::{LineRef, ParseError};
pub use patch::{Direction, PatchError};

error_set! {
    /// Top-level error for git-istage operations
    GitIStageError := {
        #[display("No {view} changes found")]
        NoChanges { view: View },
        ParseError(ParseError),
        PatchError(PatchError),
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
        #[display("Failed to get stdin handle for git {command}")]
        StdinFailed { command: String },
        #[display("Failed to write to git {command}: {message}")]
        WriteFailed { command: String, message: String },
        #[display("git apply rejected the patch:\n{output}")]
        ApplyRejected { output: String },
    }
}

/// Which set of changes a [`Document`] is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Index against worktree
    Unstaged,
    /// HEAD against index
    Staged,
}

impl View {
    /// Stage and Reset pick from unstaged changes, Unstage from staged ones.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Stage | Direction::Reset => View::Unstaged,
            Direction::Unstage => View::Staged,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            View::Unstaged => "unstaged",
            View::Staged => "staged",
        })
    }
}

/// Main interface for git-istage operations
pub struct GitIStage {
    root: PathBuf,
    git: PathBuf,
}

impl GitIStage {
    /// Use `root` as the repository's top-level directory.
    pub fn new(root: impl Into<PathBuf>, git: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            git: git.into(),
        }
    }

    /// Find the top-level directory of the repository containing `path`.
    pub fn discover(
        path: impl AsRef<Path>,
        git: impl Into<PathBuf>,
    ) -> Result<Self, GitCommandError> {
        let git = git.into();
        let probe = Self::new(path.as_ref(), git.clone());
        let output = probe.run(&["rev-parse", "--show-toplevel"], None)?;
        let root = output.stdout.trim_end_matches(['\n', '\r']);
        debug!("repository root: {root}");
        Ok(Self::new(root, git))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw per-file diff texts for `view`.
    ///
    /// Prefixes are forced to `a/`/`b/` so user diff settings cannot change
    /// the header shape. The unstaged view also lists untracked files, each
    /// as a new-file diff after the tracked ones.
    pub fn changes(&self, view: View) -> Result<Vec<String>, GitCommandError> {
        let mut args = vec![
            "diff",
            "--no-ext-diff",
            "--no-color",
            "-M",
            "--src-prefix=a/",
            "--dst-prefix=b/",
        ];
        if view == View::Staged {
            args.push("--cached");
        }

        let mut files = diff::split_files(&self.run(&args, None)?.stdout);
        if view == View::Unstaged {
            for path in self.untracked_files()? {
                files.extend(diff::split_files(&self.untracked_diff(&path)?));
            }
        }

        Ok(files)
    }

    /// Paths of untracked, non-ignored files relative to the root.
    pub fn untracked_files(&self) -> Result<Vec<String>, GitCommandError> {
        let output = self.run(&["ls-files", "--others", "--exclude-standard", "-z"], None)?;
        Ok(output
            .stdout
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Diff of an untracked file against nothing.
    fn untracked_diff(&self, path: &str) -> Result<String, GitCommandError> {
        let args = [
            "diff",
            "--no-index",
            "--no-ext-diff",
            "--no-color",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            "--",
            "/dev/null",
            path,
        ];
        // exit status 1 only means the file differs from /dev/null
        Ok(self.run_accepting(&args, None, &[0, 1])?.stdout)
    }

    /// Build the line-indexed document for `view`.
    ///
    /// # Examples
    /// ```no_run
    /// # use git_istage::{GitIStage, View};
    /// let istage = GitIStage::discover(".", "git").unwrap();
    /// let doc = istage.document(View::Unstaged).unwrap();
    /// print!("{doc}");
    /// ```
    pub fn document(&self, view: View) -> Result<Document, GitCommandError> {
        Ok(Document::parse(&self.changes(view)?))
    }

    /// Synthesize the patch for `selection` without applying it.
    pub fn preview(
        &self,
        direction: Direction,
        selection: &[LineRef],
        whole_hunks: bool,
    ) -> Result<String, GitIStageError> {
        let view = View::for_direction(direction);
        let doc = self.document(view)?;
        if doc.is_empty() {
            return Err(GitIStageError::NoChanges { view });
        }

        let selected = patch::select_lines(&doc, selection, whole_hunks)?;
        let requested: BTreeSet<usize> = selection.iter().flat_map(|r| r.indices()).collect();
        if !whole_hunks && selected.len() < requested.len() {
            warn!(
                "ignoring {} selected line(s) that are not additions or removals",
                requested.len() - selected.len()
            );
        }

        let patch = patch::compute(&doc, &selected, direction)?;
        trace!("synthesized patch:\n{patch}");
        Ok(patch)
    }

    /// Stage, unstage or reset the lines in `selection`.
    ///
    /// Line indices refer to the document of [`View::for_direction`]. Returns the
    /// patch that was applied.
    ///
    /// # Examples
    /// ```no_run
    /// # use git_istage::{Direction, GitIStage, LineRef};
    /// let istage = GitIStage::discover(".", "git").unwrap();
    /// istage
    ///     .apply_lines(Direction::Stage, &[LineRef::Range(7, 8)], false)
    ///     .unwrap();
    /// istage
    ///     .apply_lines(Direction::Reset, &[LineRef::Line(12)], true)
    ///     .unwrap();
    /// ```
    pub fn apply_lines(
        &self,
        direction: Direction,
        selection: &[LineRef],
        whole_hunks: bool,
    ) -> Result<String, GitIStageError> {
        let patch = self.preview(direction, selection, whole_hunks)?;
        if patch.is_empty() {
            return Err(PatchError::NothingSelected.into());
        }

        self.apply_patch(&patch, direction)?;
        Ok(patch)
    }

    /// Feed `patch` to `git apply` with the flags `direction` needs.
    pub fn apply_patch(&self, patch: &str, direction: Direction) -> Result<(), GitCommandError> {
        let mut args = vec!["apply", "-v"];
        if direction != Direction::Reset {
            args.push("--cached");
        }
        if direction.is_undo() {
            args.push("--reverse");
        }
        args.extend(["--whitespace=nowarn", "-"]);

        let output = self.run(&args, Some(patch))?;
        let combined = format!("{}{}", output.stdout, output.stderr);
        if combined
            .lines()
            .any(|line| line.starts_with("error:") || line.starts_with("fatal:"))
        {
            return Err(GitCommandError::ApplyRejected { output: combined });
        }

        Ok(())
    }

    /// Stage whole files
    pub fn stage_files(&self, paths: &[String]) -> Result<(), GitCommandError> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args, None).map(drop)
    }

    /// Unstage whole files
    pub fn unstage_files(&self, paths: &[String]) -> Result<(), GitCommandError> {
        let mut args = vec!["reset", "-q", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args, None).map(drop)
    }

    /// Run git inside the repository.
    fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<GitOutput, GitCommandError> {
        self.run_accepting(args, stdin, &[0])
    }

    /// Run git, treating any of the `accepted` exit codes as success.
    fn run_accepting(
        &self,
        args: &[&str],
        stdin: Option<&str>,
        accepted: &[i32],
    ) -> Result<GitOutput, GitCommandError> {
        use std::io::Write;

        let command = args.first().copied().unwrap_or_default().to_string();
        debug!("running {} -C {} {}", self.git.display(), self.root.display(), args.join(" "));

        let mut child = Command::new(&self.git)
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GitCommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if let Some(input) = stdin {
            child
                .stdin
                .take()
                .ok_or_else(|| GitCommandError::StdinFailed {
                    command: command.clone(),
                })?
                .write_all(input.as_bytes())
                .map_err(|e| GitCommandError::WriteFailed {
                    command: command.clone(),
                    message: e.to_string(),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| GitCommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output
            .status
            .code()
            .is_some_and(|code| accepted.contains(&code))
        {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::ExitError {
                command,
                stderr: stderr.into_owned(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            command,
            message: e.to_string(),
        })?;

        Ok(GitOutput {
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Captured output of a successful git invocation
struct GitOutput {
    stdout: String,
    stderr: String,
}
