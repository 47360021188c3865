use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::shell::builtins::{self, prelude::*};

#[derive(Debug)]
pub struct Cd;

#[derive(Debug, Deserialize)]
struct CdArgs {
    arg_dir: Option<String>,
}

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
Usage: cd [<dir>]

Change the current directory to DIR, resolved against the current
directory. The variable $HOME is the default DIR.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let args: CdArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;

        let dir = match args.arg_dir {
            Some(dir) => env::current_dir().context(ErrorKind::Io)?.join(dir),
            None => env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or(ErrorKind::HomeNotSet)?,
        };

        debug!("changing directory to {}", dir.display());
        env::set_current_dir(&dir)
            .with_context(|_| ErrorKind::ChangeDirectory(dir.display().to_string()))?;
        Ok(())
    }
}
