//! Terminal output and restic execution.
//!
//! # Design goals
//!
//! - **Nothing secret on screen.** The report only ever renders
//!   [`crate::redact::redact`]ed maps and an argv that carries no credentials.
//! - **restic owns the terminal.** Unlike a captured run, [`run_inherited`]
//!   hands stdin/stdout/stderr straight to the child so its progress output
//!   streams as usual.
//! - **Testable without a terminal.** [`write_report`] renders into any
//!   `io::Write`, so tests capture the text without touching stdout.

use std::{
    io::{self, Write},
    process::{Command, ExitStatus},
};

use console::style;
use tracing::{debug, info};

use crate::{config::EnvMap, error::ExecutionError};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Red ✗, printed in front of fatal errors.
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}

// ─── Report ───────────────────────────────────────────────────────────────────

/// What `--dry-run` and `--verbose` print before (or instead of) running.
#[derive(Debug)]
pub struct Report<'a> {
    pub repository: &'a str,
    /// Already shell-joined command line.
    pub command: &'a str,
    /// Must already be redacted.
    pub env: &'a EnvMap,
    pub dry_run: bool,
}

/// Render `report` into `out`.
///
/// ```text
/// Repository: s3:s3.wasabisys.com/my-bucket/travel-backup
/// Command:    restic -r s3:s3.wasabisys.com/my-bucket/travel-backup backup /etc
/// Environment (redacted):
///   AWS_ACCESS_KEY_ID=***REDACTED***
/// Dry-run mode: not running restic.
/// ```
pub fn write_report(out: &mut dyn Write, report: &Report<'_>) -> io::Result<()> {
    writeln!(out, "{} {}", style("Repository:").bold(), report.repository)?;
    writeln!(out, "{}    {}", style("Command:").bold(), report.command)?;
    writeln!(out, "{}", style("Environment (redacted):").bold())?;
    if report.env.is_empty() {
        writeln!(out, "  {}", style("(none)").dim())?;
    }
    for (key, value) in report.env {
        writeln!(out, "  {key}={value}")?;
    }
    if report.dry_run {
        writeln!(out, "{}", style("Dry-run mode: not running restic.").yellow())?;
    }
    Ok(())
}

/// [`write_report`] to stdout.
pub fn print_report(report: &Report<'_>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, report)?;
    lock.flush()
}

/// Print a fatal error to stderr.
pub fn print_error(err: impl std::fmt::Display) {
    eprintln!("{} {} {}", icon_err(), style("error:").red().bold(), err);
}

// ─── Inherited execution ──────────────────────────────────────────────────────

/// Run `program` with `args` and with `env` added to the inherited
/// environment, and wait for it.
///
/// stdin, stdout and stderr are inherited.  Returns the child's exit code
/// unchanged; a child killed by a signal reports `128 + signal` on Unix.
pub fn run_inherited(
    program: &str,
    args: &[String],
    env: &EnvMap,
) -> Result<i32, ExecutionError> {
    info!(program, "starting restic");
    let status = Command::new(program)
        .args(args)
        .envs(env)
        .status()
        .map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ExecutionError::NotFound {
                    program: program.to_string(),
                }
            } else {
                ExecutionError::Spawn {
                    program: program.to_string(),
                    source,
                }
            }
        })?;

    let code = exit_code(status);
    debug!(code, "restic finished");
    Ok(code)
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
