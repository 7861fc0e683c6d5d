//! Display-only secret masking.
//!
//! [`redact`] is applied to whatever is about to be printed.  It is never used
//! to build the environment restic actually runs with; that is
//! [`crate::runner::child_env`].

use crate::config::{ACCESS_KEY_VAR, EnvMap, PASSWORD_VAR, SECRET_KEY_VAR};

/// Replacement shown instead of a secret value.
pub const MASK: &str = "***REDACTED***";

/// Keys whose values are never printed, both as config field names and as
/// the environment variables that carry them.
pub const SECRET_KEYS: &[&str] = &[
    "access_key",
    "secret_key",
    "password",
    ACCESS_KEY_VAR,
    SECRET_KEY_VAR,
    PASSWORD_VAR,
];

/// Whether `key` names a secret.
pub fn is_secret(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

/// Copy of `env` with every secret value replaced by [`MASK`].
///
/// Non-secret entries are copied unchanged, so applying this twice gives the
/// same map as applying it once.
pub fn redact(env: &EnvMap) -> EnvMap {
    env.iter()
        .map(|(k, v)| {
            let shown = if is_secret(k) { MASK } else { v.as_str() };
            (k.clone(), shown.to_string())
        })
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
