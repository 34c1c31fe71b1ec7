//! Line-level git staging.
//!
//! Parse a file's diff, select individual added or removed lines, and stage
//! or unstage exactly those lines by applying a synthesized partial patch to
//! the index.
//!
//! ```no_run
//! # use line_stager::{Stager, parse::parse_file_refs};
//! let stager = Stager::open(".");
//! stager.stage_refs(&parse_file_refs("flake.nix:137,-140").unwrap()).unwrap();
//! ```

use error_set::error_set;
use std::path::PathBuf;
use tracing::{debug, info};

pub mod config;
pub mod diff;
pub mod git;
pub mod parse;
pub mod patch;
pub mod selection;
pub mod status;

pub use config::{Config, ConfigError};
pub use parse::ParseError;

use diff::{FileDiff, untracked_diff};
use git::{GitCli, Runner, Stream};
use parse::FileLineRefs;
use patch::PartialPatch;
use selection::{DiffSession, Selection};
use status::{ChangeStatus, FileChange, StatusLists, parse_status};

error_set! {
    /// Top-level error for line-stager operations
    StagerError := {
        #[display("No changes found in {file}")]
        NoChanges { file: String },
        #[display("No changed lines in {file} match the given references")]
        NoMatchingLines { file: String },
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to remove {path}: {message}")]
        RemoveFailed { path: String, message: String },
        ParseError(ParseError),
        ConfigError(ConfigError),
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run {program}: {message}")]
        SpawnFailed { program: String, message: String },
        #[display("Failed to open a pipe to git")]
        PipeUnavailable,
        #[display("Failed to write to git stdin: {message}")]
        WriteFailed { message: String },
        #[display("Failed to wait for git: {message}")]
        WaitFailed { message: String },
        #[display("Failed to read git output: {message}")]
        OutputReadFailed { message: String },
        #[display("Invalid UTF-8 in git output: {message}")]
        InvalidUtf8 { message: String },
        #[display("git {command} failed: {stderr}")]
        CommandFailed { command: String, stderr: String },
    }
}

/// Main interface for line-stager operations
pub struct Stager<R = GitCli> {
    runner: R,
    untracked_files: bool,
}

impl Stager<GitCli> {
    /// Stager running the `git` on `PATH` in `repo`.
    pub fn open(repo: impl Into<PathBuf>) -> Self {
        Self::new(GitCli::new(repo))
    }

    /// Stager for `repo` using the configured git program and status options.
    pub fn with_config(repo: impl Into<PathBuf>, config: &Config) -> Self {
        Self::new(GitCli::new(repo).with_program(&config.git_program))
            .with_untracked_files(config.untracked_files)
    }
}

impl<R: Runner> Stager<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            untracked_files: true,
        }
    }

    /// Whether status lists every untracked file instead of only their
    /// directories.
    pub fn with_untracked_files(mut self, enabled: bool) -> Self {
        self.untracked_files = enabled;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Scan the repository for staged and unstaged changes.
    pub fn status(&self) -> Result<StatusLists, StagerError> {
        let mut args = vec!["status", "--porcelain=v1"];
        if self.untracked_files {
            args.push("-u");
        }
        Ok(parse_status(&self.runner.run(&args)?))
    }

    /// Raw diff text of one path, against the index or (when `staged`)
    /// between HEAD and the index.
    pub fn raw_diff(&self, path: &str, staged: bool) -> Result<String, GitCommandError> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--cached");
        }
        args.extend(["--no-color", "--no-ext-diff", "--", path]);
        self.runner.run(&args)
    }

    pub fn diff(&self, path: &str, staged: bool) -> Result<FileDiff, StagerError> {
        Ok(FileDiff::parse(&self.raw_diff(path, staged)?))
    }

    /// Open a selection session for a listed change.
    ///
    /// Untracked files have no git diff, so their whole contents are shown as
    /// additions.
    pub fn load_session(
        &self,
        change: &FileChange,
        staged: bool,
    ) -> Result<DiffSession, StagerError> {
        let raw = if change.status == ChangeStatus::Untracked && !staged {
            self.untracked_raw_diff(&change.path)?
        } else {
            self.raw_diff(&change.path, staged)?
        };
        Ok(DiffSession::load(&change.path, staged, &raw))
    }

    fn untracked_raw_diff(&self, path: &str) -> Result<String, StagerError> {
        let full_path = self.runner.work_dir().join(path);
        let contents =
            std::fs::read_to_string(&full_path).map_err(|e| StagerError::ReadFailed {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(untracked_diff(path, &contents))
    }

    /// Stage or unstage the session's selected lines.
    ///
    /// Returns `false` without running git when the selection produces no
    /// hunk. After `true` the session's diff is stale and should be reloaded.
    pub fn apply_selection(&self, session: &DiffSession) -> Result<bool, StagerError> {
        Ok(self.apply_patch(&session.patch())?)
    }

    /// Apply a partial patch to the index; `false` when it is a no-op.
    pub fn apply_patch(&self, patch: &PartialPatch) -> Result<bool, GitCommandError> {
        if patch.is_noop() {
            debug!(path = %patch.path, "empty patch, nothing to apply");
            return Ok(false);
        }

        let mut args = vec!["apply", "--cached", "--unidiff-zero"];
        if patch.direction.is_reverse() {
            args.push("--reverse");
        }
        args.push("-");

        self.runner.run_with_input(&args, &patch.to_string())?;
        info!(
            path = %patch.path,
            direction = ?patch.direction,
            lines = patch.changed_lines(),
            hunks = patch.hunks.len(),
            "applied partial patch"
        );
        Ok(true)
    }

    /// Stage the referenced lines of a file's unstaged changes.
    ///
    /// # Examples
    /// ```no_run
    /// # use line_stager::{Stager, parse::parse_file_refs};
    /// let stager = Stager::open(".");
    /// stager.stage_refs(&parse_file_refs("file.nix:10..15").unwrap()).unwrap();
    /// stager.stage_refs(&parse_file_refs("config.nix:-10,-11,12").unwrap()).unwrap();
    /// ```
    pub fn stage_refs(&self, refs: &FileLineRefs) -> Result<(), StagerError> {
        self.apply_refs(refs, false)
    }

    /// Unstage the referenced lines of a file's staged changes. Numbers refer
    /// to `diff --cached` output.
    pub fn unstage_refs(&self, refs: &FileLineRefs) -> Result<(), StagerError> {
        self.apply_refs(refs, true)
    }

    fn apply_refs(&self, refs: &FileLineRefs, staged: bool) -> Result<(), StagerError> {
        let raw = self.raw_diff(&refs.file, staged)?;
        if raw.trim().is_empty() {
            return Err(StagerError::NoChanges {
                file: refs.file.clone(),
            });
        }

        let mut session = DiffSession::load(&refs.file, staged, &raw);
        let selection = Selection::from_refs(session.diff(), &refs.refs);
        if selection.is_empty() {
            return Err(StagerError::NoMatchingLines {
                file: refs.file.clone(),
            });
        }
        *session.selection_mut() = selection;

        self.apply_selection(&session)?;
        Ok(())
    }

    /// Stage whole files, including untracked and deleted ones.
    pub fn stage_files(&self, paths: &[String]) -> Result<(), StagerError> {
        self.run_with_paths(&["add", "--"], paths)
    }

    /// Reset whole files in the index back to HEAD.
    pub fn unstage_files(&self, paths: &[String]) -> Result<(), StagerError> {
        self.run_with_paths(&["restore", "--staged", "--"], paths)
    }

    pub fn stage_all(&self) -> Result<(), StagerError> {
        self.runner.run(&["add", "-A"])?;
        Ok(())
    }

    pub fn unstage_all(&self) -> Result<(), StagerError> {
        self.runner.run(&["reset", "HEAD"])?;
        Ok(())
    }

    /// Throw away work tree changes to whole files.
    ///
    /// Tracked files are checked out from the index, so staged changes
    /// survive. Untracked files are deleted.
    pub fn discard_files(&self, paths: &[String]) -> Result<(), StagerError> {
        if paths.is_empty() {
            return Ok(());
        }

        // Always list untracked files one by one so paths compare exactly.
        let lists = parse_status(&self.runner.run(&["status", "--porcelain=v1", "-u"])?);
        let (untracked, tracked): (Vec<String>, Vec<String>) =
            paths.iter().cloned().partition(|path| {
                lists
                    .unstaged
                    .iter()
                    .any(|change| change.status == ChangeStatus::Untracked && &change.path == path)
            });

        self.run_with_paths(&["checkout", "--"], &tracked)?;

        for path in &untracked {
            std::fs::remove_file(self.runner.work_dir().join(path)).map_err(|e| {
                StagerError::RemoveFailed {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        info!(
            tracked = tracked.len(),
            untracked = untracked.len(),
            "discarded changes"
        );
        Ok(())
    }

    fn run_with_paths(&self, command: &[&str], paths: &[String]) -> Result<(), StagerError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = command.to_vec();
        args.extend(paths.iter().map(String::as_str));
        self.runner.run(&args)?;
        Ok(())
    }

    /// Commit the index, forwarding git's output (hooks included) as it
    /// arrives.
    pub fn commit(
        &self,
        message: &str,
        on_output: &mut dyn FnMut(Stream, &str),
    ) -> Result<String, StagerError> {
        let output = self
            .runner
            .run_streaming(&["commit", "-m", message], on_output)?;
        info!("created commit");
        Ok(output)
    }
}
