use std::path::PathBuf;
use std::process::{self, ExitStatus};

use docopt::Docopt;
use log::{debug, error};
use nix::unistd::Pid;
use serde::Deserialize;

use smallsh::errors::Error;
use smallsh::{Shell, ShellConfig, SmallshExitStatusExt};

const LOG_FILE_NAME: &str = ".smallsh_log";

const USAGE: &str = "
smallsh.

Usage:
    smallsh [options]
    smallsh [options] -c <command>
    smallsh [options] <file>
    smallsh (-h | --help)
    smallsh --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              If the -c option is present, then commands are read from the first non-option
                        argument command_string.
    --log=<path>    File to write log to, defaults to ~/.smallsh_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("smallsh version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args);
    } else {
        execute_from_stdin();
    }
}

/// Logging is best effort: without a writable log file the shell runs silently.
fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };
    let log_file = match fern::log_file(log_path) {
        Ok(log_file) => log_file,
        Err(_) => return,
    };

    let pid = Pid::this();
    let _ = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string_or_file(args: &Args) -> ! {
    let mut shell = Shell::new(ShellConfig::noninteractive())
        .unwrap_or_else(|e| display_error_and_exit(&e));

    let result = if let Some(ref command) = args.arg_command {
        shell.execute_command_string(command)
    } else if let Some(ref file_path) = args.arg_file {
        shell.execute_commands_from_file(file_path)
    } else {
        unreachable!();
    };

    if let Err(e) = result {
        display_error(&e);
        shell.exit(Some(ExitStatus::from_failure()));
    }
    shell.exit(None)
}

fn execute_from_stdin() -> ! {
    let mut shell = Shell::new(ShellConfig::interactive())
        .unwrap_or_else(|e| display_error_and_exit(&e));
    if let Err(e) = shell.execute_from_stdin() {
        display_error(&e);
        shell.exit(Some(ExitStatus::from_failure()));
    }
    shell.exit(Some(ExitStatus::from_success()))
}

fn display_error(error: &Error) {
    error!("smallsh: {}", error);
    eprintln!("smallsh: {}", error);
}

fn display_error_and_exit(error: &Error) -> ! {
    display_error(error);
    process::exit(ExitStatus::from_failure().code().unwrap_or(1));
}
