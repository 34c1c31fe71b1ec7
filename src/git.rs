//! Running the `git` binary.
//!
//! The parsers and the patch synthesizer never touch a process; everything
//! that does goes through [`Runner`], so callers and tests can substitute it.

use crate::GitCommandError;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use tracing::debug;

/// Which pipe a streamed chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Executes git commands in one working directory.
///
/// Every method fails with [`GitCommandError::CommandFailed`], carrying the
/// captured stderr, when git exits unsuccessfully.
pub trait Runner {
    /// Directory the commands run in.
    fn work_dir(&self) -> &Path;

    /// Run to completion and return stdout.
    fn run(&self, args: &[&str]) -> Result<String, GitCommandError>;

    /// Run with `input` written to stdin and return stdout.
    fn run_with_input(&self, args: &[&str], input: &str) -> Result<String, GitCommandError>;

    /// Run while forwarding output line by line as it arrives; returns the
    /// complete stdout. Forwarded chunks are decoded lossily, while the
    /// returned stdout gets the same UTF-8 check as [`Runner::run`].
    fn run_streaming(
        &self,
        args: &[&str],
        on_output: &mut dyn FnMut(Stream, &str),
    ) -> Result<String, GitCommandError>;
}

/// [`Runner`] backed by a `git` child process.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: "git".to_string(),
            work_dir: work_dir.into(),
        }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, args: &[&str]) -> Command {
        debug!(program = %self.program, ?args, dir = %self.work_dir.display(), "running git");
        let mut command = Command::new(&self.program);
        command.args(args).current_dir(&self.work_dir);
        command
    }

    fn spawn_failed(&self, error: std::io::Error) -> GitCommandError {
        GitCommandError::SpawnFailed {
            program: self.program.clone(),
            message: error.to_string(),
        }
    }
}

impl Runner for GitCli {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn run(&self, args: &[&str]) -> Result<String, GitCommandError> {
        let output = self
            .command(args)
            .output()
            .map_err(|e| self.spawn_failed(e))?;

        stdout_of(args, output)
    }

    fn run_with_input(&self, args: &[&str], input: &str) -> Result<String, GitCommandError> {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_failed(e))?;

        // The handle drops at the end of the arm, closing stdin.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Err(io::Error::other("stdin was not piped")),
        };

        // Reap git even when the write failed; a failed exit explains it better.
        let output = child
            .wait_with_output()
            .map_err(|e| GitCommandError::WaitFailed {
                message: e.to_string(),
            })?;

        match written {
            Err(e) if output.status.success() => Err(GitCommandError::WriteFailed {
                message: e.to_string(),
            }),
            _ => stdout_of(args, output),
        }
    }

    fn run_streaming(
        &self,
        args: &[&str],
        on_output: &mut dyn FnMut(Stream, &str),
    ) -> Result<String, GitCommandError> {
        let mut child = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_failed(e))?;

        let stdout = child.stdout.take().ok_or(GitCommandError::PipeUnavailable)?;
        let stderr = child.stderr.take().ok_or(GitCommandError::PipeUnavailable)?;

        let mut captured_stdout = Vec::new();
        let mut captured_stderr = Vec::new();

        // Readers run on scoped threads; chunks reach the callback on this one.
        let read = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let stdout_tx = tx.clone();
            let readers = [
                scope.spawn(move || forward_lines(Stream::Stdout, stdout, stdout_tx)),
                scope.spawn(move || forward_lines(Stream::Stderr, stderr, tx)),
            ];

            for (stream, chunk) in rx {
                on_output(stream, &String::from_utf8_lossy(&chunk));
                match stream {
                    Stream::Stdout => captured_stdout.extend_from_slice(&chunk),
                    Stream::Stderr => captured_stderr.extend_from_slice(&chunk),
                }
            }

            readers
                .into_iter()
                .map(|reader| {
                    reader
                        .join()
                        .unwrap_or_else(|_| Err(io::Error::other("output reader panicked")))
                })
                .collect::<io::Result<()>>()
        });

        let status = child.wait().map_err(|e| GitCommandError::WaitFailed {
            message: e.to_string(),
        })?;

        let stdout = stdout_of(
            args,
            Output {
                status,
                stdout: captured_stdout,
                stderr: captured_stderr,
            },
        )?;
        read.map_err(|e| GitCommandError::OutputReadFailed {
            message: e.to_string(),
        })?;
        Ok(stdout)
    }
}

/// Send `pipe` to `tx` a line at a time until end of input.
fn forward_lines(
    stream: Stream,
    pipe: impl Read,
    tx: mpsc::Sender<(Stream, Vec<u8>)>,
) -> io::Result<()> {
    let mut reader = BufReader::new(pipe);
    loop {
        let mut buffer = Vec::new();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .inspect_err(|e| debug!(?stream, error = %e, "failed to read git output"))?;
        if read == 0 || tx.send((stream, buffer)).is_err() {
            return Ok(());
        }
    }
}

/// Stdout must be UTF-8; stderr is only shown to people, so it is decoded
/// lossily.
fn stdout_of(args: &[&str], output: Output) -> Result<String, GitCommandError> {
    if !output.status.success() {
        return Err(command_failed(args, &String::from_utf8_lossy(&output.stderr)));
    }

    String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
        message: e.to_string(),
    })
}

fn command_failed(args: &[&str], stderr: &str) -> GitCommandError {
    GitCommandError::CommandFailed {
        command: args.first().copied().unwrap_or_default().to_string(),
        stderr: stderr.trim().to_string(),
    }
}
