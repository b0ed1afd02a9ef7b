//! `list` and `run` command handlers.
//!
//! Both handlers take the invocation's [`Workspace`] and write their
//! user-facing output to any [`Write`] sink, so the binary passes stdout
//! and tests pass a buffer.

use std::io::Write;

use anyhow::Result;

use crate::{
    config::RunOptions,
    orchestrator::{Orchestrator, RunSummary},
    output::JsonListOutput,
    project::Projects,
    report::write_failures,
    status::BlockRenderer,
    workspace::Workspace,
};

/// Print every discovered project, one label per line or as JSON.
///
/// # Errors
///
/// Fails when discovery fails or `out` cannot be written.
pub fn list<W: Write>(workspace: &Workspace, json: bool, out: &mut W) -> Result<()> {
    let projects = workspace.find_projects()?;

    if json {
        let output = JsonListOutput::new(workspace.root()?, projects);
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
        return Ok(());
    }

    for project in projects {
        writeln!(out, "{project}")?;
    }

    Ok(())
}

/// Run `args` in every project whose label contains `selector`.
///
/// Live status goes to `out` while the commands run, followed by the
/// failure digest. Project failures are returned in the summary rather
/// than as an error; deciding what they mean for the exit code is up to
/// the caller.
///
/// # Errors
///
/// Fails when discovery fails, the interactive prompt is cancelled, a
/// command cannot be launched, or `out` cannot be written.
pub fn run<W: Write>(
    workspace: &Workspace,
    options: &RunOptions,
    selector: Option<&str>,
    args: &[String],
    out: &mut W,
) -> Result<RunSummary> {
    let projects = workspace.find_projects()?;

    let mut selection =
        selector.map_or_else(|| projects.as_slice().to_vec(), |s| projects.select(s));

    if options.interactive && !selection.is_empty() {
        selection = Projects::interactive_selection(&selection)?;
    }

    if selection.is_empty() {
        writeln!(out, "No projects matched")?;
        return Ok(RunSummary::default());
    }

    let orchestrator = Orchestrator::new(options.clone());
    let mut renderer = BlockRenderer::new(&mut *out, selection.len());
    let summary = orchestrator.run(&selection, args, &mut renderer)?;
    drop(renderer);

    write_failures(&summary.failures, out)?;

    Ok(summary)
}
