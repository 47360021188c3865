use crate::shell::builtins::{self, prelude::*};
use crate::util::SmallshExitStatusExt;

#[derive(Debug)]
pub struct Status;

impl builtins::BuiltinCommand for Status {
    const NAME: &'static str = builtins::STATUS_NAME;

    const HELP: &'static str = "\
Usage: status

Print the exit value or terminating signal of the last foreground command.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        check_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        writeln!(stdout, "{}", shell.last_exit_status().describe()).context(ErrorKind::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shell::{builtins::BuiltinCommand, ShellConfig};

    #[test]
    fn test_status_defaults_to_success() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        let mut output = Vec::new();
        Status::run(&mut shell, &Vec::<String>::new(), &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "exit value 0\n");
    }

    #[test]
    fn test_status_rejects_arguments() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        let mut output = Vec::new();
        assert!(Status::run(&mut shell, &["now"], &mut output).is_err());
        assert!(output.is_empty());
    }
}
