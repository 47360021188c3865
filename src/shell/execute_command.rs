//! Process Supervisor
//!
//! Forks one child per external command, wires up its redirections, and
//! replaces its image with the requested program. Everything the child needs
//! is prepared before `fork`, so the child itself only makes system calls.

use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::process::ExitStatus;

use failure::{Fail, ResultExt};
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::signal::SigSet;
use nix::sys::stat::Mode;
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};

use crate::core::job::ProcessId;
use crate::core::parser::Command;
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::signals;
use crate::util::{self, SmallshExitStatusExt};

const NULL_DEVICE: &str = "/dev/null";

/// Child exit status when a redirection target cannot be opened.
pub const REDIRECT_FAILURE_EXIT_STATUS: i32 = 1;
/// Child exit status when the program cannot be found.
pub const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;
/// Child exit status when the program was found but could not be executed.
pub const COMMAND_NOT_EXECUTABLE_EXIT_STATUS: i32 = 126;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Direction {
    Input,
    Output,
}

/// A file to open in the child and duplicate onto stdin or stdout.
#[derive(Debug)]
struct Redirect {
    path: CString,
    direction: Direction,
    /// Preformatted so the child never allocates.
    error_message: Vec<u8>,
}

impl Redirect {
    fn new(path: &str, direction: Direction) -> Result<Self> {
        let kind = match direction {
            Direction::Input => "input",
            Direction::Output => "output",
        };
        Ok(Self {
            path: to_cstring(path)?,
            direction,
            error_message: format!("cannot open {} for {}\n", path, kind).into_bytes(),
        })
    }

    fn target_fd(&self) -> RawFd {
        match self.direction {
            Direction::Input => libc::STDIN_FILENO,
            Direction::Output => libc::STDOUT_FILENO,
        }
    }

    /// Opens the file and moves it onto the target descriptor. Runs in the child.
    fn apply(&self) -> nix::Result<()> {
        let fd = match self.direction {
            Direction::Input => fcntl::open(self.path.as_c_str(), OFlag::O_RDONLY, Mode::empty())?,
            Direction::Output => fcntl::open(
                self.path.as_c_str(),
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP,
            )?,
        };

        let target = self.target_fd();
        if fd != target {
            unistd::dup2(fd, target)?;
            unistd::close(fd)?;
        }
        Ok(())
    }
}

/// A forked child running an external program.
#[derive(Clone, Debug, PartialEq)]
pub struct Process {
    argv: Vec<String>,
    id: ProcessId,
}

impl Process {
    pub fn argv(&self) -> String {
        self.argv[..].join(" ")
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Blocks until this process exits or is killed by a signal.
    pub fn wait(&self) -> Result<ExitStatus> {
        wait_for_process(self.id)
    }
}

/// Everything a child needs, built before `fork`.
#[derive(Debug)]
struct ChildPlan {
    argv: Vec<CString>,
    redirects: Vec<Redirect>,
    background: bool,
    /// `<program>: ` prefix for exec failures.
    exec_error_prefix: Vec<u8>,
}

impl ChildPlan {
    fn new(command: &Command) -> Result<Self> {
        let argv = command
            .argv
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>>>()?;

        let mut redirects = Vec::new();
        match command.stdin {
            Some(ref path) => redirects.push(Redirect::new(path, Direction::Input)?),
            None if command.background => {
                redirects.push(Redirect::new(NULL_DEVICE, Direction::Input)?)
            }
            None => {}
        }
        match command.stdout {
            Some(ref path) => redirects.push(Redirect::new(path, Direction::Output)?),
            None if command.background => {
                redirects.push(Redirect::new(NULL_DEVICE, Direction::Output)?)
            }
            None => {}
        }

        Ok(Self {
            argv,
            redirects,
            background: command.background,
            exec_error_prefix: format!("{}: ", command.program()).into_bytes(),
        })
    }

    /// Runs in the forked child and never returns. `signal_mask` is the mask
    /// to reinstate once the interpreter's handlers are gone.
    fn exec(&self, signal_mask: &SigSet) -> ! {
        let reset = signals::reset_for_child()
            .and_then(|_| signals::restore_signal_mask(signal_mask));
        if reset.is_err() {
            exit_child(libc::EXIT_FAILURE);
        }

        // Background jobs get their own process group so terminal-generated
        // signals only reach foreground work.
        if self.background {
            let _ = unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
        }

        for redirect in &self.redirects {
            if redirect.apply().is_err() {
                write_stderr(&redirect.error_message);
                exit_child(REDIRECT_FAILURE_EXIT_STATUS);
            }
        }

        let errno = match unistd::execvp(&self.argv[0], &self.argv) {
            Ok(never) => match never {},
            Err(errno) => errno,
        };
        write_stderr(&self.exec_error_prefix);
        write_stderr(errno.desc().as_bytes());
        write_stderr(b"\n");

        exit_child(match errno {
            Errno::ENOENT => COMMAND_NOT_FOUND_EXIT_STATUS,
            _ => COMMAND_NOT_EXECUTABLE_EXIT_STATUS,
        })
    }
}

/// Forks a child for `command`, returning once the child exists.
///
/// Waiting (or not) is left to the caller. A failed `fork` is reported as
/// `ErrorKind::Fork`; redirection and exec failures only affect the child's
/// exit status.
pub fn spawn_process(command: &Command) -> Result<Process> {
    let plan = ChildPlan::new(command)?;

    // Anything still buffered would be written twice.
    util::flush_stdout();

    let signal_mask = signals::block_handled_signals().context(ErrorKind::Nix)?;

    // fork(2) is unsafe in multithreaded programs; the interpreter has one
    // thread and the child only makes system calls before exec.
    let fork_result = unsafe { unistd::fork() };
    if !matches!(fork_result, Ok(ForkResult::Child)) {
        let temp_result = signals::restore_signal_mask(&signal_mask);
        log_if_err!(temp_result, "failed to restore signal mask");
    }

    match fork_result.context(ErrorKind::Fork)? {
        ForkResult::Parent { child } => {
            if command.background {
                // Also done in the child; whichever runs first wins the race.
                let temp_result = unistd::setpgid(child, child);
                log_if_err!(temp_result, "failed to set pgid for pid ({})", child);
            }
            debug!("spawned {} for {:?}", child, command.argv);
            Ok(Process {
                argv: command.argv.clone(),
                id: child.into(),
            })
        }
        ForkResult::Child => plan.exec(&signal_mask),
    }
}

/// Blocks until `pid` exits or is killed, retrying if a signal interrupts the wait.
pub fn wait_for_process(pid: ProcessId) -> Result<ExitStatus> {
    let pid = Pid::from(pid);
    loop {
        match wait::waitpid(pid, None) {
            Ok(wait_status) => {
                if let Some(status) = ExitStatus::from_wait_status(wait_status) {
                    debug!("{} finished: {}", pid, status.describe());
                    return Ok(status);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.context(ErrorKind::Nix).into()),
        }
    }
}

fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| Error::syntax(format!("{}: contains a NUL byte", s)))
}

fn write_stderr(bytes: &[u8]) {
    let _ = unistd::write(libc::STDERR_FILENO, bytes);
}

fn exit_child(code: i32) -> ! {
    // Skip atexit handlers and stdio buffers inherited from the interpreter.
    unsafe { libc::_exit(code) }
}
