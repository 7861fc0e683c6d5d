//! Command argument construction helpers.
//!
//! This module is responsible for *building* the argument list and the child
//! environment that will be handed to restic.  It deliberately does **not**
//! execute anything; process execution lives in [`crate::ui`].
//!
//! Keeping arg-building separate from execution means every function here is
//! pure and trivially unit-testable without spawning any child processes.
//!
//! # Secrets
//!
//! Credentials are passed to restic through the environment only
//! ([`child_env`]).  The argument vector never contains a secret, so nothing
//! leaks through `ps` or shell history.

use crate::config::{
    ACCESS_KEY_VAR, ENDPOINT_VAR, EnvMap, PASSWORD_VAR, ResolvedConfig, SECRET_KEY_VAR,
};

// ─── Repository URI ───────────────────────────────────────────────────────────

/// `s3:ENDPOINT/BUCKET[/PREFIX]`, without doubled or dangling slashes.
pub fn build_repo(endpoint: &str, bucket: &str, prefix: &str) -> String {
    let mut uri = format!("s3:{}", endpoint.trim_end_matches('/'));
    for part in [bucket, prefix] {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            uri.push('/');
            uri.push_str(part);
        }
    }
    uri
}

/// The repository restic will talk to.
///
/// `--repository` is used verbatim; otherwise the URI is built from the
/// endpoint, bucket and prefix.
pub fn repository_uri(cfg: &ResolvedConfig) -> String {
    match &cfg.repository {
        Some(repo) => repo.clone(),
        None => build_repo(&cfg.endpoint, &cfg.bucket, &cfg.prefix),
    }
}

// ─── restic command ───────────────────────────────────────────────────────────

/// Arguments passed to restic, after the program name:
///
/// ```text
/// -r <repository>  backup <source>
/// ```
pub fn build_backup_args(cfg: &ResolvedConfig) -> Vec<String> {
    vec![
        "-r".into(),
        repository_uri(cfg),
        "backup".into(),
        cfg.source_path.clone(),
    ]
}

/// The whole command line as shown to the user: the configured restic binary
/// followed by [`build_backup_args`].
pub fn command_line(cfg: &ResolvedConfig) -> Vec<String> {
    let mut line = vec![cfg.restic_bin.clone()];
    line.extend(build_backup_args(cfg));
    line
}

// ─── Environment ──────────────────────────────────────────────────────────────

/// Variables added to restic's environment.  Contains real secrets; never
/// print this map without passing it through [`crate::redact::redact`].
///
/// Unset credentials are omitted so an inherited value is not clobbered with
/// an empty string.
pub fn child_env(cfg: &ResolvedConfig) -> EnvMap {
    [
        (ACCESS_KEY_VAR, &cfg.access_key),
        (SECRET_KEY_VAR, &cfg.secret_key),
        (PASSWORD_VAR, &cfg.password),
    ]
    .into_iter()
    .filter(|(_, v)| !v.is_empty())
    .map(|(k, v)| (k.to_string(), v.clone()))
    .collect()
}

/// What the report shows under "Environment": the child environment plus the
/// endpoint, before redaction.
///
/// The endpoint is omitted when `--repository` overrides it.
pub fn display_env(cfg: &ResolvedConfig) -> EnvMap {
    let mut env = child_env(cfg);
    if cfg.repository.is_none() {
        env.insert(ENDPOINT_VAR.to_string(), cfg.endpoint.clone());
    }
    env
}

// ─── Shell rendering ──────────────────────────────────────────────────────────

/// Join `args` into a single line a user could paste into a POSIX shell.
///
/// Only arguments that need it are quoted.
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(String::as_str)
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
