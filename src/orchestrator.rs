//! Concurrent per-project command execution.
//!
//! Every selected project gets one child process, and all children are
//! started before any is checked. A single control thread then sweeps the
//! still-running children in index order with non-blocking `try_wait`
//! calls, sleeping briefly between sweeps, until none are left.
//!
//! Child output goes to anonymous temporary files instead of pipes. Nobody
//! reads while the child runs, so a chatty child can never block on a full
//! pipe buffer; the files are read back in full once it has exited.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;

use crate::{
    config::RunOptions,
    error::Error,
    project::Project,
    status::{Status, StatusRenderer},
};

/// How a project's command ended, when it did not succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own with this code
    Exited(i32),

    /// Killed after running longer than the timeout
    TimedOut(Duration),
}

impl Termination {
    /// The status-line state for this ending.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::Exited(0) => Status::Done,
            Self::Exited(code) => Status::Failed(code),
            Self::TimedOut(limit) => Status::TimedOut(limit),
        }
    }

    const fn is_success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// A project whose command did not exit successfully, with its captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Position of the project in the selection
    pub index: usize,

    /// The project the command ran in
    pub project: Project,

    /// How the command ended
    pub termination: Termination,

    /// Captured standard output, one entry per line
    pub stdout: Vec<String>,

    /// Captured standard error, one entry per line
    pub stderr: Vec<String>,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Number of projects whose command exited with status 0
    pub succeeded: usize,

    /// Failed projects in selection order
    pub failures: Vec<Failure>,
}

impl RunSummary {
    /// Whether every project succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One running child bound to one project.
#[derive(Debug)]
pub struct ProcessRun {
    index: usize,
    project: Project,
    child: Child,
    stdout: File,
    stderr: File,
    started: Instant,
}

impl ProcessRun {
    /// Start `argv` in the project's directory with output captured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Launch`] if `argv` is empty, the capture files cannot
    /// be created, or the operating system refuses to start the program.
    pub fn spawn(index: usize, project: Project, argv: &[String]) -> Result<Self, Error> {
        let launch_error = |program: &str, source: io::Error| Error::Launch {
            label: project.label().to_string(),
            directory: project.directory().to_path_buf(),
            program: program.to_string(),
            source,
        };

        let Some((program, args)) = argv.split_first() else {
            return Err(launch_error(
                "",
                io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
            ));
        };

        let (child, stdout, stderr) = start_captured(program, args, project.directory())
            .map_err(|e| launch_error(program, e))?;

        Ok(Self {
            index,
            project,
            child,
            stdout,
            stderr,
            started: Instant::now(),
        })
    }

    /// Check the child without blocking.
    ///
    /// Returns `None` while it is still running. A child that has outlived
    /// `timeout` is killed and reported as timed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the child's state cannot be queried.
    pub fn poll(&mut self, timeout: Option<Duration>) -> io::Result<Option<Termination>> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(Some(Termination::Exited(exit_code(status))));
        }

        if let Some(limit) = timeout
            && self.started.elapsed() >= limit
        {
            // The child may exit between try_wait and kill; wait reaps it either way.
            let _ = self.child.kill();
            self.child.wait()?;
            return Ok(Some(Termination::TimedOut(limit)));
        }

        Ok(None)
    }

    /// Read the captured output back into a [`Failure`].
    fn into_failure(mut self, termination: Termination) -> io::Result<Failure> {
        Ok(Failure {
            index: self.index,
            termination,
            stdout: read_lines(&mut self.stdout)?,
            stderr: read_lines(&mut self.stderr)?,
            project: self.project,
        })
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// The still-running children of a run.
///
/// Dropping it kills whatever is left, so an error that aborts the run does
/// not leave orphaned processes behind.
#[derive(Debug, Default)]
struct ActiveRuns(Vec<ProcessRun>);

impl Drop for ActiveRuns {
    fn drop(&mut self) {
        for run in &mut self.0 {
            run.kill();
        }
    }
}

/// Runs one command in many projects at once.
#[derive(Debug, Default)]
pub struct Orchestrator {
    options: RunOptions,
}

impl Orchestrator {
    /// Create an orchestrator with the given run options.
    #[must_use]
    pub const fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Run `args` (behind the configured launcher) in every project of `selection`.
    ///
    /// Line `i` of `renderer` belongs to `selection[i]` for the whole run.
    /// Project failures are collected into the summary and never stop the
    /// other projects.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Launch`] if any command cannot be started, after
    /// killing the ones already running. Also fails if the status output
    /// cannot be written or captured output cannot be read.
    pub fn run<R: StatusRenderer>(
        &self,
        selection: &[Project],
        args: &[String],
        renderer: &mut R,
    ) -> Result<RunSummary> {
        for (index, project) in selection.iter().enumerate() {
            renderer.set(index, Status::Initializing.line(project.label()))?;
        }

        let argv = self.options.command_line(args);
        let mut active = ActiveRuns(Vec::with_capacity(selection.len()));

        for (index, project) in selection.iter().enumerate() {
            active.0.push(ProcessRun::spawn(index, project.clone(), &argv)?);
            renderer.set(index, Status::InProgress.line(project.label()))?;
        }

        let mut summary = RunSummary::default();

        while !active.0.is_empty() {
            let mut i = 0;
            while i < active.0.len() {
                let Some(termination) = active.0[i].poll(self.options.timeout)? else {
                    i += 1;
                    continue;
                };

                let run = active.0.remove(i);
                renderer.set(
                    run.index,
                    termination.status().line(run.project.label()),
                )?;

                if termination.is_success() {
                    summary.succeeded += 1;
                } else {
                    summary.failures.push(run.into_failure(termination)?);
                }
            }

            if !active.0.is_empty() {
                thread::sleep(self.options.poll_interval);
            }
        }

        renderer.finish()?;
        summary.failures.sort_by_key(|failure| failure.index);

        Ok(summary)
    }
}

/// Start `program` in `dir` with stdout and stderr redirected to fresh temp files.
fn start_captured(program: &str, args: &[String], dir: &Path) -> io::Result<(Child, File, File)> {
    let stdout = tempfile::tempfile()?;
    let stderr = tempfile::tempfile()?;

    let child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(stdout.try_clone()?)
        .stderr(stderr.try_clone()?)
        .spawn()?;

    Ok((child, stdout, stderr))
}

/// Exit code of a finished child; a signal death maps to the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    status.code().unwrap_or(-1)
}

fn read_lines(file: &mut File) -> io::Result<Vec<String>> {
    file.seek(SeekFrom::Start(0))?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    Ok(String::from_utf8_lossy(&buf)
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect())
}
