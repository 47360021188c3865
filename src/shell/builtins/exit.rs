use crate::shell::builtins::{self, prelude::*};

#[derive(Debug)]
pub struct Exit;

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
Usage: exit

Exit the shell with a status of 0. Background jobs still running are sent
SIGTERM first.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        check_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        shell.request_exit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use crate::shell::{builtins::BuiltinCommand, ShellConfig};

    #[test]
    fn test_exit_requests_stop() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        assert!(!shell.exit_requested());
        Exit::run(&mut shell, &Vec::<String>::new(), &mut io::sink()).unwrap();
        assert!(shell.exit_requested());
    }

    #[test]
    fn test_exit_rejects_arguments() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        assert!(Exit::run(&mut shell, &["1"], &mut io::sink()).is_err());
        assert!(!shell.exit_requested());
    }
}
