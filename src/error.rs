//! Error taxonomy.
//!
//! Three families, each mapped to its own exit code by [`Error::exit_code`]:
//!
//! | Type               | Raised by            | Exit        |
//! |--------------------|----------------------|-------------|
//! | [`ConfigError`]    | [`crate::config`]    | 2           |
//! | [`EnvFileError`]   | [`crate::envfile`]   | 2           |
//! | [`ExecutionError`] | [`crate::ui`]        | 126 / 127   |
//!
//! A non-zero exit from restic itself is *not* an error here; it is passed
//! through unchanged by [`crate::commands::run`].

use std::{io, path::PathBuf};

use thiserror::Error;

/// Exit code for configuration and env-file problems.  Matches argparse.
pub const EXIT_USAGE: u8 = 2;

/// Exit code when the program exists but could not be launched.
pub const EXIT_CANNOT_EXECUTE: u8 = 126;

/// Exit code when the program could not be found.
pub const EXIT_NOT_FOUND: u8 = 127;

// ─── ConfigError ──────────────────────────────────────────────────────────────

/// A required field is still missing after every layer has been consulted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing source path: pass --source <PATH>")]
    MissingSource,

    #[error("--bucket is required when --repository is not provided")]
    MissingBucket,

    /// One entry per missing secret, e.g. `"access key (--access-key or AWS_ACCESS_KEY_ID)"`.
    #[error("missing credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),
}

// ─── EnvFileError ─────────────────────────────────────────────────────────────

/// The `.env` file could not be used.
///
/// A *missing* default `.env` never produces this error; only an explicitly
/// requested file that is absent does.
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("env file '{}' not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("reading env file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing env file '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

// ─── ExecutionError ───────────────────────────────────────────────────────────

/// restic could not be started at all.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("'{program}' not found; is restic installed and on PATH?")]
    NotFound { program: String },

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

// ─── Top-level ────────────────────────────────────────────────────────────────

/// Everything that can stop a backup before (or instead of) restic running.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    EnvFile(#[from] EnvFileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl Error {
    /// Process exit code for this error.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::EnvFile(_) => EXIT_USAGE,
            Self::Execution(ExecutionError::NotFound { .. }) => EXIT_NOT_FOUND,
            Self::Execution(_) => EXIT_CANNOT_EXECUTE,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
