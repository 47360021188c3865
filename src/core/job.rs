use std::fmt;

use nix::{libc, unistd::Pid};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ProcessId(u32);

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value)
    }
}

impl From<Pid> for ProcessId {
    fn from(value: Pid) -> Self {
        libc::pid_t::from(value).into()
    }
}

impl From<libc::pid_t> for ProcessId {
    fn from(value: libc::pid_t) -> Self {
        ProcessId(value as u32)
    }
}

impl From<ProcessId> for Pid {
    fn from(value: ProcessId) -> Self {
        Pid::from_raw(value.0 as libc::pid_t)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A background child that has not been reaped yet.
#[derive(Clone, Debug, PartialEq)]
pub struct JobRecord {
    pid: ProcessId,
    input: String,
}

impl JobRecord {
    pub fn new<T: AsRef<str>>(pid: ProcessId, input: T) -> Self {
        Self {
            pid,
            input: input.as_ref().to_string(),
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// The command line that started the job, used for logging.
    pub fn input(&self) -> &str {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_round_trip() {
        let pid = Pid::from_raw(1234);
        let id = ProcessId::from(pid);
        assert_eq!(id.to_string(), "1234");
        assert_eq!(Pid::from(id), pid);
    }
}
