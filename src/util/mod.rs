use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::wait::WaitStatus;

/// Logs the error of a `Result` without propagating it.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {
        if let Err(ref e) = $result {
            error!(concat!($fmt, ": {}"), e);
        }
    };
    ($result:expr, $fmt:expr, $($arg:tt)+) => {
        if let Err(ref e) = $result {
            error!(concat!($fmt, ": {}"), $($arg)+, e);
        }
    };
}

/// Smallsh Utility Extensions for `ExitStatus`
pub trait SmallshExitStatusExt {
    /// Create an ExitStatus to indicate *successful* program execution.
    fn from_success() -> Self;

    /// Create an ExitStatus to indicate *unsuccessful* program execution.
    fn from_failure() -> Self;

    /// Create an ExitStatus from a status code
    fn from_status(code: i32) -> Self;

    /// Create an ExitStatus for a process terminated by signal number `signo`.
    fn from_signal(signo: i32) -> Self;

    /// Convert a `waitpid` result, returning `None` unless the process is gone.
    fn from_wait_status(wait_status: WaitStatus) -> Option<Self>
    where
        Self: Sized;

    /// `exit value N` or `terminated by signal N`.
    fn describe(&self) -> String;
}

impl SmallshExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use smallsh::SmallshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_success().success());
    /// ```
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    /// # Examples
    /// ```rust
    /// use smallsh::SmallshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(!ExitStatus::from_failure().success());
    /// ```
    fn from_failure() -> Self {
        ExitStatus::from_status(1)
    }

    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw((code & 0xff) << 8)
    }

    fn from_signal(signo: i32) -> Self {
        ExitStatus::from_raw(signo & 0x7f)
    }

    fn from_wait_status(wait_status: WaitStatus) -> Option<Self> {
        match wait_status {
            WaitStatus::Exited(_, code) => Some(ExitStatus::from_status(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitStatus::from_signal(signal as i32)),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match (self.code(), self.signal()) {
            (_, Some(signo)) => format!("terminated by signal {}", signo),
            (Some(code), _) => format!("exit value {}", code),
            (None, None) => format!("exit value {}", self.into_raw()),
        }
    }
}

/// Flushes standard output, ignoring failures (e.g. a closed pipe).
pub fn flush_stdout() {
    let temp_result = io::stdout().flush();
    log_if_err!(temp_result, "failed to flush stdout");
}

#[cfg(test)]
mod tests {
    use super::*;

    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    #[test]
    fn test_describe_exit_value() {
        assert_eq!(ExitStatus::from_status(0).describe(), "exit value 0");
        assert_eq!(ExitStatus::from_status(3).describe(), "exit value 3");
    }

    #[test]
    fn test_describe_signal() {
        assert_eq!(ExitStatus::from_signal(15).describe(), "terminated by signal 15");
    }

    #[test]
    fn test_from_wait_status() {
        let pid = Pid::from_raw(42);
        let exited = ExitStatus::from_wait_status(WaitStatus::Exited(pid, 2)).unwrap();
        assert_eq!(exited.code(), Some(2));

        let signaled =
            ExitStatus::from_wait_status(WaitStatus::Signaled(pid, Signal::SIGINT, false)).unwrap();
        assert_eq!(signaled.signal(), Some(2));

        assert!(ExitStatus::from_wait_status(WaitStatus::StillAlive).is_none());
    }
}
