//! Configuration types and resolution.
//!
//! `ResolvedConfig` is the single record the rest of the program works with.
//! It is built once per run by [`resolve`] from four layers, queried in
//! priority order with first-hit-wins semantics:
//!
//! | Priority | Layer         | Keys                                      |
//! |----------|---------------|-------------------------------------------|
//! | 1        | `cli`         | flags, translated to env-var names        |
//! | 2        | `environment` | process environment (snapshot from main)  |
//! | 3        | `env file`    | `.env` or `--env-file`                    |
//! | 4        | `default`     | `WASABI_ENDPOINT`, `WASABI_PREFIX` only   |
//!
//! Every layer is keyed by the environment-variable name of the field, so a
//! lookup is the same operation regardless of where the value came from.
//! Empty values count as unset in every layer.
//!
//! # Environment variables
//!
//! ```text
//! AWS_ACCESS_KEY_ID      --access-key
//! AWS_SECRET_ACCESS_KEY  --secret-key
//! RESTIC_PASSWORD        --password / -P
//! WASABI_ENDPOINT        --endpoint / -e   (default s3.wasabisys.com)
//! WASABI_PREFIX          --prefix / -p     (default travel-backup)
//! WASABI_REGION          --region          (selects s3.<region>.wasabisys.com)
//! ```

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use tracing::debug;

use crate::{
    cli::Cli,
    envfile,
    error::{ConfigError, Error},
    redact::MASK,
};

/// Flat string map used for the environment, the env file, and display.
///
/// A `BTreeMap` keeps printed output in a stable order.
pub type EnvMap = BTreeMap<String, String>;

// ─── Variable names ───────────────────────────────────────────────────────────

pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const PASSWORD_VAR: &str = "RESTIC_PASSWORD";
pub const ENDPOINT_VAR: &str = "WASABI_ENDPOINT";
pub const PREFIX_VAR: &str = "WASABI_PREFIX";
pub const REGION_VAR: &str = "WASABI_REGION";

/// Keys read from the environment and the env file.
pub const RECOGNIZED_KEYS: &[&str] = &[
    ACCESS_KEY_VAR,
    SECRET_KEY_VAR,
    PASSWORD_VAR,
    ENDPOINT_VAR,
    PREFIX_VAR,
    REGION_VAR,
];

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_ENDPOINT: &str = "s3.wasabisys.com";
pub const DEFAULT_PREFIX: &str = "travel-backup";

/// Wasabi's regional endpoint for `region`, e.g. `s3.us-west-1.wasabisys.com`.
pub fn regional_endpoint(region: &str) -> String {
    format!("s3.{region}.wasabisys.com")
}

// ─── ResolvedConfig ───────────────────────────────────────────────────────────

/// Fully merged configuration for one run.
///
/// Immutable once [`resolve`] returns.  `Debug` masks the secret fields so the
/// struct can be logged; use [`ResolvedConfig::redacted`] before serialising.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// File or directory handed to `restic backup`.
    pub source_path: String,

    /// Bucket name.  Empty when only `--repository` was given.
    pub bucket: String,

    pub endpoint: String,

    pub prefix: String,

    pub access_key: String,

    pub secret_key: String,

    pub password: String,

    /// Full repository string.  When set it wins over bucket/endpoint/prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    pub dry_run: bool,

    pub verbose: bool,

    /// Program to execute, normally `restic`.
    pub restic_bin: String,
}

impl ResolvedConfig {
    /// Copy of `self` with every secret field replaced by the redaction mask.
    ///
    /// Unset secrets stay empty so the output still shows what is missing.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |s: &str| {
            if s.is_empty() {
                String::new()
            } else {
                MASK.to_string()
            }
        };
        Self {
            access_key: mask(&self.access_key),
            secret_key: mask(&self.secret_key),
            password: mask(&self.password),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.redacted();
        f.debug_struct("ResolvedConfig")
            .field("source_path", &shown.source_path)
            .field("bucket", &shown.bucket)
            .field("endpoint", &shown.endpoint)
            .field("prefix", &shown.prefix)
            .field("access_key", &shown.access_key)
            .field("secret_key", &shown.secret_key)
            .field("password", &shown.password)
            .field("repository", &shown.repository)
            .field("dry_run", &shown.dry_run)
            .field("verbose", &shown.verbose)
            .field("restic_bin", &shown.restic_bin)
            .finish()
    }
}

// ─── Layers ───────────────────────────────────────────────────────────────────

/// One configuration source.
struct Layer {
    name: &'static str,
    values: EnvMap,
}

/// Ordered sources, highest priority first.
struct Layers(Vec<Layer>);

impl Layers {
    /// First non-empty value for `key`, together with the name of the layer
    /// that supplied it.
    fn lookup(&self, key: &str) -> Option<(&str, &'static str)> {
        self.0.iter().find_map(|layer| {
            layer
                .values
                .get(key)
                .filter(|v| !v.is_empty())
                .map(|v| (v.as_str(), layer.name))
        })
    }

    /// Like [`Layers::lookup`] but returns an owned value and logs where it
    /// came from.  Secret values are never logged.
    fn get(&self, key: &str) -> Option<String> {
        let (value, origin) = self.lookup(key)?;
        debug!(key, origin, "resolved");
        Some(value.to_string())
    }
}

/// Translate CLI flags into the env-var key space.
fn cli_layer(cli: &Cli) -> EnvMap {
    [
        (ACCESS_KEY_VAR, &cli.access_key),
        (SECRET_KEY_VAR, &cli.secret_key),
        (PASSWORD_VAR, &cli.password),
        (ENDPOINT_VAR, &cli.endpoint),
        (PREFIX_VAR, &cli.prefix),
        (REGION_VAR, &cli.region),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
    .collect()
}

/// Keep only the variables this tool understands.
fn recognized(env: &EnvMap) -> EnvMap {
    env.iter()
        .filter(|(k, _)| RECOGNIZED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn default_layer() -> EnvMap {
    EnvMap::from([
        (ENDPOINT_VAR.to_string(), DEFAULT_ENDPOINT.to_string()),
        (PREFIX_VAR.to_string(), DEFAULT_PREFIX.to_string()),
    ])
}

// ─── Resolution ───────────────────────────────────────────────────────────────

/// Load the env file named by `cli` and merge it with the CLI and
/// `process_env`.
///
/// A missing default `.env` is silently ignored; see [`envfile::load`].
pub fn resolve(cli: &Cli, process_env: &EnvMap) -> Result<ResolvedConfig, Error> {
    let (path, explicit) = cli.env_file();
    let dotenv = envfile::load(path, explicit)?;
    Ok(resolve_layers(cli, dotenv, process_env)?)
}

/// Merge the three sources and validate the result.
///
/// Pure: depends on nothing but its arguments.
pub fn resolve_layers(
    cli: &Cli,
    dotenv: EnvMap,
    process_env: &EnvMap,
) -> Result<ResolvedConfig, ConfigError> {
    let source_path = non_empty(cli.source.as_deref()).ok_or(ConfigError::MissingSource)?;
    let repository = non_empty(cli.repository.as_deref());
    // Slashes are stripped from the URI, so `/` alone names no bucket.
    let bucket = non_empty(cli.bucket.as_deref().map(|b| b.trim_matches('/')));

    // Defaults are kept apart so the region can slot in between an explicit
    // endpoint (any layer) and the default endpoint.
    let explicit = Layers(vec![
        Layer {
            name: "cli",
            values: cli_layer(cli),
        },
        Layer {
            name: "environment",
            values: recognized(process_env),
        },
        Layer {
            name: "env file",
            values: dotenv,
        },
    ]);
    let defaults = Layers(vec![Layer {
        name: "default",
        values: default_layer(),
    }]);
    let get = |key: &str| explicit.get(key).or_else(|| defaults.get(key));

    let endpoint = explicit
        .get(ENDPOINT_VAR)
        .or_else(|| explicit.get(REGION_VAR).map(|r| regional_endpoint(&r)))
        .or_else(|| defaults.get(ENDPOINT_VAR))
        .unwrap_or_default();

    let cfg = ResolvedConfig {
        source_path,
        bucket: bucket.unwrap_or_default(),
        endpoint,
        prefix: get(PREFIX_VAR).unwrap_or_default(),
        access_key: get(ACCESS_KEY_VAR).unwrap_or_default(),
        secret_key: get(SECRET_KEY_VAR).unwrap_or_default(),
        password: get(PASSWORD_VAR).unwrap_or_default(),
        repository,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        restic_bin: cli.restic_bin.clone(),
    };

    validate(&cfg)?;
    debug!(?cfg, "configuration resolved");
    Ok(cfg)
}

/// `--repository` is authoritative: when present, bucket and credentials are
/// not required.
fn validate(cfg: &ResolvedConfig) -> Result<(), ConfigError> {
    if cfg.repository.is_some() {
        return Ok(());
    }
    if cfg.bucket.is_empty() {
        return Err(ConfigError::MissingBucket);
    }

    let missing: Vec<String> = [
        ("access key", "--access-key", ACCESS_KEY_VAR, &cfg.access_key),
        ("secret key", "--secret-key", SECRET_KEY_VAR, &cfg.secret_key),
        ("password", "--password", PASSWORD_VAR, &cfg.password),
    ]
    .into_iter()
    .filter(|(.., value)| value.is_empty())
    .map(|(name, flag, var, _)| format!("{name} ({flag} or {var})"))
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingCredentials(missing))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn make_cli(extra: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("wasabi-backup").chain(extra.iter().copied()))
    }

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn creds() -> EnvMap {
        env(&[
            (ACCESS_KEY_VAR, "env-access"),
            (SECRET_KEY_VAR, "env-secret"),
            (PASSWORD_VAR, "env-password"),
        ])
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn defaults_fill_endpoint_and_prefix() {
        let cli = make_cli(&["--source", "/etc", "--bucket", "my-bucket"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap();
        assert_eq!(cfg.endpoint, "s3.wasabisys.com");
        assert_eq!(cfg.prefix, "travel-backup");
        assert_eq!(cfg.source_path, "/etc");
        assert_eq!(cfg.bucket, "my-bucket");
    }

    // ── precedence ────────────────────────────────────────────────────────────

    #[test]
    fn cli_beats_environment_and_env_file() {
        let cli = make_cli(&[
            "-s", "/etc", "-b", "b", "--access-key", "cli-access", "-e", "cli.example", "-p",
            "cli-prefix",
        ]);
        let process = env(&[
            (ACCESS_KEY_VAR, "env-access"),
            (SECRET_KEY_VAR, "env-secret"),
            (PASSWORD_VAR, "env-password"),
            (ENDPOINT_VAR, "env.example"),
            (PREFIX_VAR, "env-prefix"),
        ]);
        let dotenv = env(&[
            (ACCESS_KEY_VAR, "file-access"),
            (ENDPOINT_VAR, "file.example"),
            (PREFIX_VAR, "file-prefix"),
        ]);
        let cfg = resolve_layers(&cli, dotenv, &process).unwrap();
        assert_eq!(cfg.access_key, "cli-access");
        assert_eq!(cfg.endpoint, "cli.example");
        assert_eq!(cfg.prefix, "cli-prefix");
        assert_eq!(cfg.secret_key, "env-secret");
    }

    #[test]
    fn environment_beats_env_file() {
        let cli = make_cli(&["-s", "/etc", "-b", "b"]);
        let dotenv = env(&[
            (ACCESS_KEY_VAR, "file-access"),
            (SECRET_KEY_VAR, "file-secret"),
            (PASSWORD_VAR, "file-password"),
        ]);
        let process = env(&[(PASSWORD_VAR, "env-password")]);
        let cfg = resolve_layers(&cli, dotenv, &process).unwrap();
        assert_eq!(cfg.password, "env-password");
        assert_eq!(cfg.access_key, "file-access");
        assert_eq!(cfg.secret_key, "file-secret");
    }

    #[test]
    fn env_file_beats_defaults() {
        let cli = make_cli(&["-s", "/etc", "-b", "b"]);
        let dotenv = env(&[(ENDPOINT_VAR, "file.example"), (PREFIX_VAR, "photos")]);
        let cfg = resolve_layers(&cli, dotenv, &creds()).unwrap();
        assert_eq!(cfg.endpoint, "file.example");
        assert_eq!(cfg.prefix, "photos");
    }

    #[test]
    fn empty_values_do_not_shadow_lower_layers() {
        let cli = make_cli(&["-s", "/etc", "-b", "b", "--password", ""]);
        let mut process = creds();
        process.insert(ACCESS_KEY_VAR.into(), String::new());
        let dotenv = env(&[(ACCESS_KEY_VAR, "file-access")]);
        let cfg = resolve_layers(&cli, dotenv, &process).unwrap();
        assert_eq!(cfg.access_key, "file-access");
        assert_eq!(cfg.password, "env-password");
    }

    #[test]
    fn unrelated_environment_is_ignored() {
        let cli = make_cli(&["-s", "/etc", "-b", "b"]);
        let mut process = creds();
        process.insert("HOME".into(), "/root".into());
        process.insert("RESTIC_REPOSITORY".into(), "s3:elsewhere".into());
        let cfg = resolve_layers(&cli, EnvMap::new(), &process).unwrap();
        assert!(cfg.repository.is_none());
    }

    // ── region ────────────────────────────────────────────────────────────────

    #[test]
    fn region_selects_regional_endpoint() {
        let cli = make_cli(&["-s", "/etc", "-b", "b", "--region", "eu-central-1"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap();
        assert_eq!(cfg.endpoint, "s3.eu-central-1.wasabisys.com");
    }

    #[test]
    fn explicit_endpoint_beats_region() {
        let cli = make_cli(&["-s", "/etc", "-b", "b", "--region", "us-west-1"]);
        let dotenv = env(&[(ENDPOINT_VAR, "s3.custom.example")]);
        let cfg = resolve_layers(&cli, dotenv, &creds()).unwrap();
        assert_eq!(cfg.endpoint, "s3.custom.example");
    }

    // ── validation ────────────────────────────────────────────────────────────

    #[test]
    fn missing_source_is_a_config_error() {
        let cli = make_cli(&["-b", "b"]);
        let err = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap_err();
        assert_eq!(err, ConfigError::MissingSource);
    }

    #[test]
    fn missing_bucket_and_repository_is_a_config_error() {
        let cli = make_cli(&["-s", "/etc"]);
        let err = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap_err();
        assert_eq!(err, ConfigError::MissingBucket);
    }

    #[test]
    fn slash_only_bucket_is_missing() {
        for bucket in ["/", "//"] {
            let cli = make_cli(&["-s", "/etc", "-b", bucket]);
            let err = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap_err();
            assert_eq!(err, ConfigError::MissingBucket, "bucket {bucket:?}");
        }
    }

    #[test]
    fn bucket_slashes_are_trimmed() {
        let cli = make_cli(&["-s", "/etc", "-b", "/bkt/"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap();
        assert_eq!(cfg.bucket, "bkt");
    }

    #[test]
    fn repository_makes_bucket_optional() {
        let cli = make_cli(&["-s", "/etc", "--repository", "custom:uri"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &EnvMap::new()).unwrap();
        assert_eq!(cfg.repository.as_deref(), Some("custom:uri"));
        assert!(cfg.bucket.is_empty());
    }

    #[test]
    fn missing_credentials_are_all_reported() {
        let cli = make_cli(&["-s", "/etc", "-b", "b", "--secret-key", "s"]);
        let err = resolve_layers(&cli, EnvMap::new(), &EnvMap::new()).unwrap_err();
        let ConfigError::MissingCredentials(missing) = err else {
            panic!("expected MissingCredentials, got {err:?}");
        };
        assert_eq!(missing.len(), 2);
        assert!(missing[0].contains(ACCESS_KEY_VAR));
        assert!(missing[1].contains(PASSWORD_VAR));
    }

    // ── redaction ─────────────────────────────────────────────────────────────

    #[test]
    fn debug_output_hides_secrets() {
        let cli = make_cli(&["-s", "/etc", "-b", "b"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap();
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("env-secret"));
        assert!(!shown.contains("env-password"));
        assert!(shown.contains(MASK));
    }

    #[test]
    fn redacted_keeps_non_secret_fields() {
        let cli = make_cli(&["-s", "/etc", "-b", "b"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap();
        let r = cfg.redacted();
        assert_eq!(r.access_key, MASK);
        assert_eq!(r.bucket, cfg.bucket);
        assert_eq!(r.endpoint, cfg.endpoint);
        assert_eq!(r.redacted(), r);
    }

    #[test]
    fn redacted_config_serialises_to_toml() {
        let cli = make_cli(&["-s", "/etc", "-b", "b"]);
        let cfg = resolve_layers(&cli, EnvMap::new(), &creds()).unwrap();
        let text = toml::to_string(&cfg.redacted()).expect("serialisation failed");
        assert!(text.contains("bucket = \"b\""));
        assert!(!text.contains("env-password"));
        assert!(!text.contains("repository"));
    }
}
