//! Job Table & Reaper
//!
//! Background children are tracked by pid until a non-blocking `waitpid`
//! reports that they are gone. Only tracked pids are ever waited on here, so
//! the reaper cannot steal the status of a foreground child.

use std::fmt;
use std::io::Write;
use std::process::ExitStatus;

use failure::ResultExt;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::core::job::{JobRecord, ProcessId};
use crate::errors::{ErrorKind, Result};
use crate::util::SmallshExitStatusExt;

#[derive(Default)]
pub struct JobManager {
    jobs: Vec<JobRecord>,
}

impl JobManager {
    pub fn create_job(&mut self, input: &str, pid: ProcessId) {
        debug!("tracking background job {} ({})", pid, input);
        self.jobs.push(JobRecord::new(pid, input));
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn get_jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    /// Collects every tracked job that has finished, without blocking, and
    /// removes it from the table.
    pub fn update_job_statuses(&mut self) -> Vec<(JobRecord, ExitStatus)> {
        let mut finished = Vec::new();
        self.jobs.retain(|job| match try_wait(job.pid()) {
            Ok(Some(status)) => {
                debug!("{} finished: {}", job.pid(), status.describe());
                finished.push((job.clone(), status));
                false
            }
            Ok(None) => true,
            Err(Errno::ECHILD) => {
                warn!("{} is no longer a child, dropping it", job.pid());
                false
            }
            Err(e) => {
                error!("failed to check status of {}: {}", job.pid(), e);
                true
            }
        });
        finished
    }

    /// Reports finished background jobs and forgets them.
    pub fn do_job_notification(&mut self, stdout: &mut dyn Write) -> Result<()> {
        for (job, status) in self.update_job_statuses() {
            writeln!(
                stdout,
                "background pid {} is done: {}",
                job.pid(),
                status.describe()
            )
            .context(ErrorKind::Io)?;
        }
        stdout.flush().context(ErrorKind::Io)?;
        Ok(())
    }

    /// Sends SIGTERM to every tracked job and stops tracking them. Does not
    /// wait for them to die.
    pub fn kill_jobs(&mut self) {
        for job in self.jobs.drain(..) {
            debug!("terminating background job {} ({})", job.pid(), job.input());
            let temp_result = signal::kill(Pid::from(job.pid()), Signal::SIGTERM);
            log_if_err!(temp_result, "failed to terminate {}", job.pid());
        }
    }
}

/// `Ok(None)` while the process is still running.
fn try_wait(pid: ProcessId) -> nix::Result<Option<ExitStatus>> {
    loop {
        match wait::waitpid(Pid::from(pid), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => return Ok(None),
            Ok(wait_status) => {
                if let Some(status) = ExitStatus::from_wait_status(wait_status) {
                    return Ok(Some(status));
                }
                // Stop/continue notifications are not requested; keep polling.
            }
            Err(Errno::EINTR) => {}
            Err(e) => return Err(e),
        }
    }
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs", self.jobs.len())?;
        for job in &self.jobs {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}
