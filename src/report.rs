//! Post-run failure digest.

use std::io::{self, Write};

use colored::Colorize;

use crate::orchestrator::{Failure, Termination};

/// Write the captured output of every failed project to `out`.
///
/// Failures are written in the order given, which the orchestrator keeps in
/// label order. Nothing is written when `failures` is empty.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn write_failures<W: Write>(failures: &[Failure], out: &mut W) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n{}", "failures:".bold())?;

    for failure in failures {
        let label = failure.project.label();

        writeln!(out, "{}", header(label, failure.termination))?;

        let stdout_prefix = format!("[{label}:stdout]").bright_black();
        for line in &failure.stdout {
            writeln!(out, "{stdout_prefix} {}", line.blue())?;
        }

        let stderr_prefix = format!("[{label}:stderr]").bright_black();
        for line in &failure.stderr {
            writeln!(out, "{stderr_prefix} {}", line.red())?;
        }
    }

    Ok(())
}

fn header(label: &str, termination: Termination) -> String {
    match termination {
        Termination::Exited(code) => format!("[{label}] failed with return code {code}"),
        Termination::TimedOut(limit) => {
            format!("[{label}] timed out after {}s", limit.as_secs_f64())
        }
    }
}
