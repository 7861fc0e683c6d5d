//! `wasabi-backup`: back up a path to Wasabi S3 with restic.
//!
//! # Overview
//!
//! A thin wrapper around [`restic`](https://restic.net).  It works out the
//! S3 repository string and the credentials from CLI flags, the environment
//! and an optional `.env` file (in that order of precedence), then runs
//! `restic backup` or, with `--dry-run`, prints what it would run.
//!
//! # Usage
//!
//! ```text
//! wasabi-backup -s ~/Pictures/japan -b my-bucket            # back up
//! wasabi-backup -s ~/Pictures/japan -b my-bucket --dry-run  # show the command
//! wasabi-backup -s /etc -r s3:s3.wasabisys.com/other/etc    # explicit repo
//! wasabi-backup init                                        # scaffold .env
//! wasabi-backup -s /etc -b my-bucket --print-config         # show merged config
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | `ResolvedConfig` + layered resolution       |
//! | [`envfile`]              | `.env` loading                              |
//! | [`redact`]               | Secret masking for display                  |
//! | [`runner`]               | Repository URI, argv, child environment     |
//! | [`ui`]                   | Report output and restic execution          |
//! | [`logging`]              | `tracing` subscriber setup                  |
//! | [`error`]                | Error types and exit codes                  |
//! | [`commands::init`]       | `init` subcommand                           |
//! | [`commands::run`]        | Default dry-run / execute dispatch          |

mod cli;
mod commands;
mod config;
mod envfile;
mod error;
mod logging;
mod redact;
mod runner;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Subcommand};
use config::{EnvMap, ResolvedConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        // ── wasabi-backup init ────────────────────────────────────────────────
        Some(Subcommand::Init) => match commands::init::run(cli.env_file().0) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                ui::print_error(format!("{e:#}"));
                ExitCode::FAILURE
            },
        },

        // ── wasabi-backup (default) ───────────────────────────────────────────
        None => backup(&cli),
    }
}

/// Resolve, then print the config, dry-run, or execute.
fn backup(cli: &Cli) -> ExitCode {
    let cfg = match config::resolve(cli, &process_env()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::print_error(&e);
            return ExitCode::from(e.exit_code());
        },
    };

    if cli.print_config {
        return match print_config(&cfg) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                ui::print_error(format!("{e:#}"));
                ExitCode::FAILURE
            },
        };
    }

    match commands::run::run(&cfg) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            ui::print_error(&e);
            ExitCode::from(e.exit_code())
        },
    }
}

/// `--print-config`: the merged configuration as TOML, secrets masked.
fn print_config(cfg: &ResolvedConfig) -> Result<()> {
    let text = toml::to_string(&cfg.redacted()).context("serialising configuration")?;
    print!("{text}");
    Ok(())
}

/// Snapshot of the process environment.  Non-UTF-8 entries are skipped.
fn process_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
