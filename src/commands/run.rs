//! Default command, run when no subcommand is given.
//!
//! ```text
//! ResolvedConfig ─┬─ dry_run ─────────────► report ──► 0
//!                 └─ otherwise ─ [report] ─► restic ──► restic's exit code
//! ```
//!
//! Nothing is retried.  restic's own exit code is returned unchanged; only a
//! failure to *start* restic becomes an error.

use tracing::{info, warn};

use crate::{
    config::{EnvMap, ResolvedConfig},
    error::Error,
    redact::redact,
    runner::{
        build_backup_args, child_env, command_line, display_env, repository_uri, shell_join,
    },
    ui::{Report, print_report, run_inherited},
};

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Print or execute the backup described by `cfg`, returning the exit code.
pub fn run(cfg: &ResolvedConfig) -> Result<i32, Error> {
    let plan = Plan::new(cfg);

    if cfg.dry_run || cfg.verbose {
        plan.print(cfg.dry_run);
    }

    if cfg.dry_run {
        info!("dry run, restic not started");
        return Ok(0);
    }

    Ok(run_inherited(&plan.program, &plan.args, &child_env(cfg))?)
}

// ─── Plan ─────────────────────────────────────────────────────────────────────

/// Everything the report needs, computed once.  Holds no secrets.
#[derive(Debug)]
pub struct Plan {
    pub repository: String,
    pub program: String,
    /// Arguments after `program`.
    pub args: Vec<String>,
    /// `program` and `args` quoted for a POSIX shell.
    pub command: String,
    /// Redacted display environment.
    pub env: EnvMap,
}

impl Plan {
    pub fn new(cfg: &ResolvedConfig) -> Self {
        Self {
            repository: repository_uri(cfg),
            program: cfg.restic_bin.clone(),
            args: build_backup_args(cfg),
            command: shell_join(&command_line(cfg)),
            env: redact(&display_env(cfg)),
        }
    }

    fn print(&self, dry_run: bool) {
        let report = Report {
            repository: &self.repository,
            command: &self.command,
            env: &self.env,
            dry_run,
        };
        // A closed stdout (e.g. `| head`) must not stop the backup.
        if let Err(e) = print_report(&report) {
            warn!("could not print report: {e}");
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
