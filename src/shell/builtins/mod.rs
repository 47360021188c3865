//! Smallsh builtins
//!
//! Commands the interpreter runs itself instead of forking: `cd`, `status`,
//! and `exit`. None of them change the recorded foreground exit status.

use std::iter;

use docopt::Docopt;
use serde::de::DeserializeOwned;

use self::prelude::*;

use self::dirs::Cd;
use self::exit::Exit;
use self::status::Status;

pub mod prelude {
    pub use std::io::Write;

    pub use failure::ResultExt;

    pub use super::{check_args, parse_args};
    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::shell::Shell;
}

mod dirs;
mod exit;
mod status;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const STATUS_NAME: &str = "status";

/// Represents a Smallsh builtin command such as cd or status.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user, in docopt format.
    const HELP: &'static str;
    /// The usage string to display to the user.
    fn usage() -> &'static str {
        Self::HELP.lines().next().unwrap_or(Self::NAME)
    }
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

/// Checked in the order the interpreter resolves names: `cd`, `status`, `exit`.
pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, STATUS_NAME, EXIT_NAME].contains(&program.as_ref())
}

/// precondition: command is a builtin.
pub fn run<S1, S2>(shell: &mut Shell, program: S1, args: &[S2], stdout: &mut dyn Write) -> Result<()>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));
    debug!(
        "running builtin {} {:?}",
        program.as_ref(),
        args.iter().map(AsRef::as_ref).collect::<Vec<&str>>()
    );

    match program.as_ref() {
        CD_NAME => Cd::run(shell, args, stdout),
        STATUS_NAME => Status::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        _ => unreachable!(),
    }
}

/// Parses builtin arguments against a docopt `usage` string.
pub fn parse_args<D, S, I>(usage: &str, program: S, args: I) -> Result<D>
where
    D: DeserializeOwned,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let program = program.as_ref();
    Docopt::new(usage)
        .and_then(|d| d.help(false).argv(argv(program, args)).deserialize())
        .map_err(|e| {
            debug!("{}: {}", program, e);
            usage_error(program, usage)
        })
}

/// Like `parse_args` for builtins that take no arguments.
pub fn check_args<S, I>(usage: &str, program: S, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let program = program.as_ref();
    Docopt::new(usage)
        .and_then(|d| d.help(false).argv(argv(program, args)).parse())
        .map(|_| ())
        .map_err(|e| {
            debug!("{}: {}", program, e);
            usage_error(program, usage)
        })
}

fn argv<S, I>(program: &str, args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    iter::once(program.to_string())
        .chain(args.into_iter().map(|arg| arg.as_ref().to_string()))
        .collect()
}

fn usage_error(program: &str, usage: &str) -> Error {
    let usage = usage.lines().next().unwrap_or(program);
    Error::builtin_command(format!("{}: invalid arguments\n{}", program, usage))
}
