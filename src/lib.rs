//! Smallsh - Small Shell
//!
//! A line-oriented command interpreter: `$$` expansion, `<`/`>` redirection,
//! `&` background jobs, the `cd`, `status`, and `exit` builtins, and a
//! SIGTSTP-controlled foreground-only mode.

#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]

#[macro_use]
extern crate log;

#[macro_use]
mod util;

pub mod core;
pub mod errors;
pub mod shell;

pub use crate::shell::{Shell, ShellConfig};
pub use crate::util::SmallshExitStatusExt;
