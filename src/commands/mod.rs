//! Subcommand handlers.
//!
//! Each file in this module corresponds to one user-facing command:
//!
//! | File          | Invocation                   | Description                  |
//! |---------------|------------------------------|------------------------------|
//! | `init.rs`     | `wasabi-backup init`         | Scaffold a `.env` file       |
//! | `run.rs`      | `wasabi-backup` (default)    | Print or run restic backup   |

pub mod init;
pub mod run;
