//! `.env` loading.
//!
//! The file is parsed with [`dotenvy::from_read_iter`], which yields key/value
//! pairs without touching the process environment.  The result is one layer
//! of the merge in [`crate::config`]; it never overrides the environment or
//! the CLI.
//!
//! Only the keys in [`RECOGNIZED_KEYS`] are kept.  Anything else in the file
//! (other tools often share a `.env`) is skipped with a debug log.
//!
//! # `$` in values
//!
//! dotenvy expands `$VAR` in unquoted and double-quoted values, which would
//! silently truncate a password such as `pa$word1`.  Before parsing, values of
//! recognized keys that contain `$` are rewritten into single-quoted form so
//! they load literally.  Values that cannot be rewritten safely (they already
//! contain quotes, backslashes or `#`) are left to dotenvy with a warning.

use std::{fs, io, path::Path};

use tracing::{debug, warn};

use crate::{
    config::{EnvMap, RECOGNIZED_KEYS},
    error::EnvFileError,
};

/// Load `path` into an [`EnvMap`].
///
/// When the file is missing, an empty map is returned unless `explicit` is
/// set, in which case [`EnvFileError::NotFound`] is raised.  Unreadable or
/// malformed files are always an error.
pub fn load(path: &Path, explicit: bool) -> Result<EnvMap, EnvFileError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if explicit {
                return Err(EnvFileError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            debug!(path = %path.display(), "no env file, skipping");
            return Ok(EnvMap::new());
        },
        Err(source) => {
            return Err(EnvFileError::Read {
                path: path.to_path_buf(),
                source,
            });
        },
    };

    let text = keep_dollars_literal(&text);
    let mut values = EnvMap::new();
    for item in dotenvy::from_read_iter(text.as_bytes()) {
        let (key, value) = item.map_err(|e| classify(path, e))?;
        if RECOGNIZED_KEYS.contains(&key.as_str()) {
            values.insert(key, value);
        } else {
            debug!(%key, "ignoring unrecognized env file key");
        }
    }

    debug!(path = %path.display(), keys = values.len(), "loaded env file");
    Ok(values)
}

fn classify(path: &Path, err: dotenvy::Error) -> EnvFileError {
    match err {
        dotenvy::Error::Io(source) => EnvFileError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => EnvFileError::Parse {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

// ─── Literal `$` ──────────────────────────────────────────────────────────────

/// Single-quote every recognized `KEY=value` line whose value holds a `$`.
fn keep_dollars_literal(text: &str) -> String {
    text.lines()
        .map(|line| literal_line(line).unwrap_or_else(|| line.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The rewritten line, or `None` to keep `line` as it is.
fn literal_line(line: &str) -> Option<String> {
    let (lhs, value) = line.split_once('=')?;
    let key = lhs.trim().trim_start_matches("export ").trim();
    if !RECOGNIZED_KEYS.contains(&key) {
        return None;
    }

    let value = value.trim();
    if !value.contains('$') || value.starts_with('\'') {
        return None;
    }

    let inner = match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"')?,
        None => value,
    };
    if inner.contains(['\'', '"', '\\', '#']) {
        warn!(key, "'$' in value will be expanded; single-quote the value to keep it literal");
        return None;
    }

    Some(format!("{lhs}='{inner}'"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
