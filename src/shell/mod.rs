//! Smallsh - Shell Module
//!
//! The Shell runs the read, expand, parse, dispatch loop and owns the job
//! table and the last foreground exit status.

pub use self::shell::Shell;

pub mod builtins;
pub mod execute_command;
pub mod job_control;
#[allow(clippy::module_inception)]
pub mod shell;
pub mod signals;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if the `: ` prompt is written before every read.
    display_prompt: bool,

    /// Determines if the SIGINT and SIGTSTP handlers are installed.
    install_signal_handlers: bool,
}

impl ShellConfig {
    /// Creates a shell that reads commands from standard input.
    ///
    /// # Complete List
    /// - The prompt is displayed before every read, even if stdin is not a terminal
    /// - SIGINT and SIGTSTP handlers are installed
    pub fn interactive() -> Self {
        Self {
            display_prompt: true,
            install_signal_handlers: true,
        }
    }

    /// Creates a shell that runs a command string or a script file.
    ///
    /// # Complete List
    /// - No prompt is displayed
    /// - SIGINT and SIGTSTP handlers are installed
    pub fn noninteractive() -> Self {
        Self {
            display_prompt: false,
            install_signal_handlers: true,
        }
    }
}

/// No prompt and no signal handlers; suited to embedding.
impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            display_prompt: false,
            install_signal_handlers: false,
        }
    }
}
