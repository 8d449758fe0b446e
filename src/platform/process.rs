//! External process execution with hard timeouts
//!
//! A process that outlives its timeout gets SIGTERM, then SIGKILL after a
//! short grace period, and is always reaped before `run` returns. The grace
//! period comes out of the timeout, so `run` never takes longer than it.
//!
//! Captured output goes to scratch files rather than pipes: a chatty child
//! never blocks on a full pipe, and a backgrounded grandchild holding the
//! descriptors cannot keep `run` waiting for EOF.

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use wait_timeout::ChildExt;

use crate::error::ProcessError;

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// File streamed to the child's stdin
    pub stdin_file: Option<PathBuf>,
    /// Collect stdout/stderr; disable for tools that daemonize and keep the pipes open
    pub capture_output: bool,
}

impl ProcessCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin_file: None,
            capture_output: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }

    pub fn discard_output(mut self) -> Self {
        self.capture_output = false;
        self
    }

    /// Short program name for logs and error messages
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Result of a process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs external programs on behalf of capture and export strategies
pub trait ProcessRunner {
    fn run(&self, command: &ProcessCommand, timeout: Duration)
    -> Result<ProcessOutput, ProcessError>;
}

/// [`ProcessRunner`] backed by `std::process`
#[derive(Debug, Clone)]
pub struct SystemProcessRunner {
    /// Time between SIGTERM and SIGKILL for a timed-out child
    grace: Duration,
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(500),
        }
    }
}

impl SystemProcessRunner {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(
        &self,
        command: &ProcessCommand,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let program = command.display_name();
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        let captured = if command.capture_output {
            let stdout = tempfile::tempfile()?;
            let stderr = tempfile::tempfile()?;
            cmd.stdout(Stdio::from(stdout.try_clone()?))
                .stderr(Stdio::from(stderr.try_clone()?));
            Some((stdout, stderr))
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
            None
        };
        match &command.stdin_file {
            Some(path) => cmd.stdin(Stdio::from(File::open(path)?)),
            None => cmd.stdin(Stdio::null()),
        };

        log::debug!("Running {} {:?}", command.program.display(), command.args);
        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

        let grace = self.grace.min(timeout / 2);
        match child.wait_timeout(timeout - grace)? {
            Some(status) => {
                let (stdout, stderr) = match captured {
                    Some((mut stdout, mut stderr)) => {
                        (read_back(&mut stdout)?, read_back(&mut stderr)?)
                    }
                    None => (Vec::new(), Vec::new()),
                };
                Ok(ProcessOutput {
                    exit_code: status.code(),
                    stdout,
                    stderr,
                })
            }
            None => {
                log::warn!("{} exceeded {:?}, terminating", program, timeout);
                terminate(&mut child, grace);
                Err(ProcessError::TimedOut { program, timeout })
            }
        }
    }
}

/// Everything written to a scratch output file so far
fn read_back(file: &mut File) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// SIGTERM, wait up to `grace`, then SIGKILL; always reaps the child
fn terminate(child: &mut Child, grace: Duration) {
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
        log::warn!("Failed to send SIGTERM to process {}: {}", pid, e);
    }

    if let Ok(Some(_)) = child.wait_timeout(grace) {
        return;
    }

    log::warn!(
        "Process {} did not terminate gracefully, force killing",
        pid
    );
    if let Err(e) = child.kill() {
        log::error!("Failed to kill process {}: {}", pid, e);
    }
    let _ = child.wait();
}

/// Whether `path` is an executable regular file
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;

    #[test]
    fn captures_exit_code_and_stdout() {
        let runner = SystemProcessRunner::default();
        let command = ProcessCommand::new("/bin/sh").args(["-c", "printf hello; exit 3"]);
        let output = runner.run(&command, Duration::from_secs(5)).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout_text(), "hello");
        assert!(!output.success());
    }

    #[test]
    fn feeds_stdin_from_file() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        input.write_all(b"piped bytes").unwrap();

        let runner = SystemProcessRunner::default();
        let command = ProcessCommand::new("/bin/cat").stdin_file(input.path());
        let output = runner.run(&command, Duration::from_secs(5)).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, b"piped bytes");
    }

    #[test]
    fn timed_out_process_is_terminated() {
        let runner = SystemProcessRunner::new(Duration::from_millis(100));
        let command = ProcessCommand::new("/bin/sleep").arg("30");
        let started = Instant::now();
        let err = runner
            .run(&command, Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn grace_period_fits_inside_the_timeout() {
        let runner = SystemProcessRunner::new(Duration::from_millis(500));
        // Ignores SIGTERM so the full grace period is spent
        let command = ProcessCommand::new("/bin/sh").args(["-c", "trap '' TERM; sleep 30"]);
        let started = Instant::now();
        let err = runner.run(&command, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_millis(1400));
    }

    #[test]
    fn large_output_does_not_stall_the_child() {
        let runner = SystemProcessRunner::default();
        let command =
            ProcessCommand::new("/bin/sh").args(["-c", "head -c 200000 /dev/zero; exit 0"]);
        let output = runner.run(&command, Duration::from_secs(5)).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 200_000);
    }

    #[test]
    fn background_grandchild_does_not_hold_run_open() {
        let runner = SystemProcessRunner::default();
        let command = ProcessCommand::new("/bin/sh").args(["-c", "sleep 6 & echo started"]);
        let started = Instant::now();
        let output = runner.run(&command, Duration::from_secs(1)).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout_text().trim(), "started");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runner = SystemProcessRunner::default();
        let command = ProcessCommand::new("/nonexistent/snapmark-tool");
        let err = runner.run(&command, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn display_name_is_the_file_name() {
        let command = ProcessCommand::new("/usr/bin/grim");
        assert_eq!(command.display_name(), "grim");
    }
}
