//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the resolver and the command handlers.
//!
//! Every flag is optional at the clap level.  Required fields (`--source`,
//! `--bucket` without `--repository`, credentials) are checked by
//! [`crate::config::resolve`] after the `.env` file and the environment have
//! been merged in, so a missing value produces a `ConfigError` rather than a
//! clap usage error.

use std::path::{Path, PathBuf};

use clap::Parser;

/// Env file consulted when `--env-file` is not given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "wasabi-backup",
    about   = "Back up files to Wasabi S3 with restic",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Subcommand to run.  Omit to run the backup.
    #[command(subcommand)]
    pub command: Option<Subcommand>,

    /// Path to the file or directory to back up.
    #[arg(short, long, value_name = "PATH")]
    pub source: Option<String>,

    /// Wasabi S3 bucket name.  Required unless `--repository` is given.
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// S3 endpoint host [env: WASABI_ENDPOINT] [default: s3.wasabisys.com]
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Folder inside the bucket [env: WASABI_PREFIX] [default: travel-backup]
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Wasabi region, e.g. `us-west-1` [env: WASABI_REGION]
    ///
    /// Selects the endpoint `s3.<region>.wasabisys.com` when no endpoint is
    /// set explicitly.
    #[arg(long)]
    pub region: Option<String>,

    /// S3 access key [env: AWS_ACCESS_KEY_ID]
    #[arg(long)]
    pub access_key: Option<String>,

    /// S3 secret key [env: AWS_SECRET_ACCESS_KEY]
    #[arg(long)]
    pub secret_key: Option<String>,

    /// restic repository password [env: RESTIC_PASSWORD]
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Full restic repository string.  Overrides bucket, endpoint and prefix.
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Dotenv file with credentials and defaults [default: .env]
    ///
    /// A missing default `.env` is ignored; a missing file named explicitly
    /// is an error.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Print the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the resolved command before running it and enable debug logs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the resolved configuration (secrets redacted) and exit.
    #[arg(long)]
    pub print_config: bool,

    /// restic executable to invoke.
    #[arg(long, value_name = "PROGRAM", default_value = "restic")]
    pub restic_bin: String,
}

impl Cli {
    /// The env file to load, and whether the user named it explicitly.
    pub fn env_file(&self) -> (&Path, bool) {
        match &self.env_file {
            Some(p) => (p.as_path(), true),
            None => (Path::new(DEFAULT_ENV_FILE), false),
        }
    }
}

/// Explicit subcommands.  Running `wasabi-backup` with no subcommand performs
/// the backup.
#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// Scaffold a `.env` file with the credential variables.
    ///
    /// Writes to `--env-file` (default `.env`).  Exits with an error if the
    /// file already exists to avoid clobbering real credentials.
    Init,
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("wasabi-backup").chain(extra.iter().copied()))
    }

    #[test]
    fn short_flags_map_to_fields() {
        let cli = parse(&[
            "-s", "/etc", "-b", "bkt", "-e", "host", "-p", "pre", "-P", "pw", "-r", "s3:x",
        ]);
        assert_eq!(cli.source.as_deref(), Some("/etc"));
        assert_eq!(cli.bucket.as_deref(), Some("bkt"));
        assert_eq!(cli.endpoint.as_deref(), Some("host"));
        assert_eq!(cli.prefix.as_deref(), Some("pre"));
        assert_eq!(cli.password.as_deref(), Some("pw"));
        assert_eq!(cli.repository.as_deref(), Some("s3:x"));
    }

    #[test]
    fn flags_default_to_off() {
        let cli = parse(&[]);
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(!cli.print_config);
        assert_eq!(cli.restic_bin, "restic");
        assert!(cli.command.is_none());
    }

    #[test]
    fn env_file_defaults_to_dot_env() {
        let cli = parse(&[]);
        assert_eq!(cli.env_file(), (Path::new(".env"), false));
    }

    #[test]
    fn explicit_env_file_is_flagged() {
        let cli = parse(&["--env-file", "secrets.env"]);
        assert_eq!(cli.env_file(), (Path::new("secrets.env"), true));
    }

    #[test]
    fn init_subcommand_parses() {
        let cli = parse(&["--env-file", "x.env", "init"]);
        assert_eq!(cli.command, Some(Subcommand::Init));
    }
}
