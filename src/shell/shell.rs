use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{self, ExitStatus};

use failure::{Fail, ResultExt};
use nix::unistd::Pid;

use super::{
    builtins,
    execute_command::spawn_process,
    job_control::JobManager,
    signals, ShellConfig,
};
use crate::{
    core::{
        parser::{self, Command},
        variable_expansion,
    },
    errors::{ErrorKind, Result},
    util::{self, SmallshExitStatusExt},
};

const PROMPT: &str = ": ";

/// Smallsh Shell
pub struct Shell {
    job_manager: JobManager,
    /// Exit status of the last foreground command executed.
    last_exit_status: ExitStatus,
    config: ShellConfig,
    /// Substituted for `$$`.
    pid: Pid,
    /// Set by the `exit` builtin; the caller stops reading commands.
    exit_requested: bool,
}

impl Shell {
    /// Constructs a new Shell, installing signal handlers if configured to.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        if config.install_signal_handlers {
            signals::install_handlers()?;
        }

        info!("smallsh started up");
        Ok(Shell {
            job_manager: Default::default(),
            last_exit_status: ExitStatus::from_success(),
            config,
            pid: Pid::this(),
            exit_requested: false,
        })
    }

    /// Writes the prompt and reads one line, without its line terminator.
    /// Returns `None` when end of file is reached.
    pub fn prompt<R: BufRead>(&mut self, input: &mut R) -> Result<Option<String>> {
        if self.config.display_prompt {
            print!("{}", PROMPT);
        }
        util::flush_stdout();

        let mut line = String::new();
        loop {
            match input.read_line(&mut line) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(ref e) if e.kind() == io::ErrorKind::InvalidData => {
                    // read_line has consumed the bad line; treat it as blank.
                    eprintln!("smallsh: input is not valid UTF-8");
                    return Ok(Some(String::new()));
                }
                Err(e) => return Err(e.context(ErrorKind::Io).into()),
            }
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Runs one line: expand, tokenize, parse, then dispatch to a builtin or
    /// a child process.
    ///
    /// Only fatal errors are returned; everything else is reported on stderr
    /// and the shell carries on.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        let line = variable_expansion::expand_variables(input, self.pid);
        let tokens = parser::tokenize(&line, signals::is_foreground_only());

        let result = match Command::parse(tokens) {
            Ok(Some(command)) => self.execute_command(&command, input),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            if e.is_fatal() {
                error!("fatal error running '{}': {}", input, e);
                return Err(e);
            }
            warn!("'{}' failed: {}", input, e);
            eprintln!("smallsh: {}", e);
        }
        Ok(())
    }

    /// Runs a smallsh script from a file, one line at a time.
    pub fn execute_commands_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path).context(ErrorKind::Io)?;
        let mut reader = BufReader::new(file);
        self.execute_lines(&mut reader)
    }

    /// Runs commands from stdin until EOF or `exit`.
    pub fn execute_from_stdin(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.execute_lines(&mut input)
    }

    fn execute_lines<R: BufRead>(&mut self, input: &mut R) -> Result<()> {
        while !self.exit_requested {
            // Check the status of background jobs, removing exited ones.
            self.check_jobs();

            let line = match self.prompt(input)? {
                Some(line) => line,
                None => {
                    // Unlike `exit`, the exit status stays that of the last
                    // foreground command.
                    debug!("end of input");
                    self.job_manager.kill_jobs();
                    break;
                }
            };

            self.execute_command_string(&line)?;
        }

        Ok(())
    }

    /// Runs a parsed command.
    fn execute_command(&mut self, command: &Command, input: &str) -> Result<()> {
        if builtins::is_builtin(command.program()) {
            return self.execute_builtin(command);
        }

        let process = spawn_process(command)?;
        if command.background {
            println!("background pid is {}", process.id());
            util::flush_stdout();
            self.job_manager.create_job(input, process.id());
        } else {
            debug!("waiting for foreground process {} ({})", process.id(), process.argv());
            self.last_exit_status = process.wait()?;
        }
        Ok(())
    }

    /// Builtins run in the shell itself. An output redirection is honored;
    /// input redirection and `&` have no effect.
    fn execute_builtin(&mut self, command: &Command) -> Result<()> {
        match command.stdout {
            Some(ref path) => {
                let mut file = std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o640)
                    .open(path)
                    .with_context(|_| ErrorKind::Redirect(path.clone()))?;
                builtins::run(self, command.program(), command.args(), &mut file)
            }
            None => {
                let stdout = io::stdout();
                let mut stdout = stdout.lock();
                let result = builtins::run(self, command.program(), command.args(), &mut stdout);
                let temp_result = stdout.flush();
                log_if_err!(temp_result, "failed to flush stdout");
                result
            }
        }
    }

    /// Reports and forgets background jobs that have finished.
    pub fn check_jobs(&mut self) {
        let stdout = io::stdout();
        let temp_result = self.job_manager.do_job_notification(&mut stdout.lock());
        log_if_err!(temp_result, "do_job_notification");
    }

    /// Exit status of the last foreground command, or success if none has run.
    pub fn last_exit_status(&self) -> ExitStatus {
        self.last_exit_status
    }

    /// Returns `true` if the shell has background jobs.
    pub fn has_background_jobs(&self) -> bool {
        self.job_manager.has_jobs()
    }

    /// Terminates outstanding background jobs and asks the caller to stop
    /// reading commands.
    pub fn request_exit(&mut self) {
        if self.job_manager.has_jobs() {
            self.job_manager.kill_jobs();
        }
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Exit the shell.
    ///
    /// Exit the shell with a status of n. If n is None, the status is 0 after
    /// `exit`, otherwise that of the last foreground command, with
    /// signal-terminated commands reported as 128 + the signal number.
    pub fn exit(&mut self, n: Option<ExitStatus>) -> ! {
        let status = match n {
            Some(n) => n,
            None if self.exit_requested => ExitStatus::from_success(),
            None => self.last_exit_status,
        };
        self.job_manager.kill_jobs();

        let code = match (status.code(), status.signal()) {
            (Some(code), _) => code,
            (None, Some(signo)) => 128 + signo,
            (None, None) => 1,
        };

        util::flush_stdout();
        info!("smallsh has shut down");
        process::exit(code);
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid: {}\tlast status: {:?}\n{:?}",
            self.pid, self.last_exit_status, self.job_manager
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::Cursor;
    use std::thread;
    use std::time::{Duration, Instant};

    fn shell() -> Shell {
        Shell::new(ShellConfig::default()).unwrap()
    }

    #[test]
    fn test_prompt_strips_line_terminators() {
        let mut shell = shell();
        let mut input = Cursor::new("ls -la\nstatus\r\nlast");
        assert_eq!(shell.prompt(&mut input).unwrap(), Some("ls -la".to_string()));
        assert_eq!(shell.prompt(&mut input).unwrap(), Some("status".to_string()));
        assert_eq!(shell.prompt(&mut input).unwrap(), Some("last".to_string()));
        assert_eq!(shell.prompt(&mut input).unwrap(), None);
    }

    #[test]
    fn test_blank_and_comment_lines_keep_status() {
        let mut shell = shell();
        shell.execute_command_string("false").unwrap();
        assert_eq!(shell.last_exit_status().code(), Some(1));

        for line in &["", "   ", "# comment", "#", "&"] {
            shell.execute_command_string(line).unwrap();
            assert_eq!(shell.last_exit_status().code(), Some(1));
        }
    }

    /// Writes `body` to a script in `dir` and returns its path.
    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_hash_prefixed_word_runs_as_a_command() {
        let mut shell = shell();
        shell.execute_command_string("#smallsh-test-no-such-program").unwrap();
        assert_eq!(shell.last_exit_status().code(), Some(127));
    }

    #[test]
    fn test_foreground_status_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell();

        let exit_seven = script(dir.path(), "exit_seven.sh", "exit 7\n");
        shell.execute_command_string(&format!("sh {}", exit_seven)).unwrap();
        assert_eq!(shell.last_exit_status().code(), Some(7));

        shell.execute_command_string("true").unwrap();
        assert!(shell.last_exit_status().success());

        let killed = script(dir.path(), "killed.sh", "kill -TERM $$\n");
        shell.execute_command_string(&format!("sh {}", killed)).unwrap();
        assert_eq!(shell.last_exit_status().signal(), Some(15));
        assert_eq!(shell.last_exit_status().describe(), "terminated by signal 15");
    }

    #[test]
    fn test_exec_failure_only_affects_child() {
        let mut shell = shell();
        shell
            .execute_command_string("smallsh-test-no-such-program")
            .unwrap();
        assert_eq!(shell.last_exit_status().code(), Some(127));
        assert!(!shell.exit_requested());
    }

    #[test]
    fn test_output_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let mut shell = shell();

        shell
            .execute_command_string(&format!("echo hello world > {}", out.display()))
            .unwrap();
        assert!(shell.last_exit_status().success());
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello world\n");

        shell
            .execute_command_string(&format!("wc -w < {} > {}.count", out.display(), out.display()))
            .unwrap();
        let count = fs::read_to_string(format!("{}.count", out.display())).unwrap();
        assert_eq!(count.trim(), "2");
    }

    #[test]
    fn test_missing_input_file_fails_child() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell();
        shell
            .execute_command_string(&format!("cat < {}/missing", dir.path().display()))
            .unwrap();
        assert_eq!(shell.last_exit_status().code(), Some(1));
    }

    #[test]
    fn test_background_job_is_tracked_and_reaped() {
        let mut shell = shell();
        shell.execute_command_string("true").unwrap();
        shell.execute_command_string("false &").unwrap();
        assert!(shell.has_background_jobs());
        // Background completion never touches the foreground status.
        assert!(shell.last_exit_status().success());

        let deadline = Instant::now() + Duration::from_secs(10);
        while shell.has_background_jobs() {
            assert!(Instant::now() < deadline, "background job was never reaped");
            shell.check_jobs();
            thread::sleep(Duration::from_millis(10));
        }
        assert!(shell.last_exit_status().success());
    }

    #[test]
    fn test_exit_terminates_background_jobs() {
        let mut shell = shell();
        shell.execute_command_string("sleep 30 &").unwrap();
        assert!(shell.has_background_jobs());

        shell.execute_command_string("exit").unwrap();
        assert!(shell.exit_requested());
        assert!(!shell.has_background_jobs());
    }

    #[test]
    fn test_syntax_errors_are_not_fatal() {
        let mut shell = shell();
        assert!(shell.execute_command_string("cat <").is_ok());
        assert!(shell.last_exit_status().success());
    }

    #[test]
    fn test_execute_lines_stops_at_exit() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let script = format!("exit\necho unreachable > {}\n", out.display());

        let mut shell = shell();
        shell.execute_lines(&mut Cursor::new(script)).unwrap();
        assert!(shell.exit_requested());
        assert!(!out.exists());
    }

    #[test]
    fn test_end_of_input_terminates_jobs_and_keeps_status() {
        let mut shell = shell();
        shell
            .execute_lines(&mut Cursor::new("sleep 30 &\nfalse\n"))
            .unwrap();
        assert!(!shell.exit_requested());
        assert!(!shell.has_background_jobs());
        assert_eq!(shell.last_exit_status().code(), Some(1));
    }
}
