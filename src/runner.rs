use crate::core::{CommandOutput, Invocation};
use crate::error::{Result, UpdaterError};
use crate::shell::{self, ShellFlavor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Every external interaction goes through this trait.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `invocation` to completion with captured output. `Err` only when
    /// the process could not be spawned or awaited.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Runs invocations through the platform shell.
pub struct ShellRunner {
    flavor: ShellFlavor,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            flavor: ShellFlavor::native(),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command_line = shell::render(invocation, self.flavor);
        let (shell_program, shell_flag) = self.flavor.launcher();
        debug!("Spawning {} {} {}", shell_program, shell_flag, command_line);

        let mut command = Command::new(shell_program);
        match self.flavor {
            // cmd re-parses its own command line, so hand it over verbatim
            #[cfg(windows)]
            ShellFlavor::Cmd => {
                command
                    .raw_arg(shell::cmd_raw_args(&command_line))
                    .creation_flags(CREATE_NO_WINDOW);
            }
            _ => {
                command.arg(shell_flag).arg(&command_line);
            }
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|source| UpdaterError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        Ok(CommandOutput::from_output(output))
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Exit(i32, String),
    SpawnError(String),
}

/// Records invocations instead of spawning them. Every command succeeds
/// unless a scripted rule matches its command line.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    rules: Mutex<Vec<(String, Scripted)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose line contains `pattern` exit with status 1 and `stderr`.
    pub fn fail_on(self, pattern: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.rules
            .lock()
            .push((pattern.into(), Scripted::Exit(1, stderr.into())));
        self
    }

    /// Commands whose line contains `pattern` fail to spawn.
    pub fn spawn_error_on(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules
            .lock()
            .push((pattern.into(), Scripted::SpawnError(message.into())));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.lock().iter().map(Invocation::command_line).collect()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().push(invocation.clone());
        let line = invocation.command_line();

        let scripted = self
            .rules
            .lock()
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone());

        match scripted {
            None => Ok(CommandOutput::succeeded(String::new())),
            Some(Scripted::Exit(code, stderr)) => Ok(CommandOutput::failed(code, stderr)),
            Some(Scripted::SpawnError(message)) => Err(UpdaterError::Spawn {
                command: line,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            }),
        }
    }
}

/// Reporting wrapper over a `CommandRunner`: prints captured stdout on
/// success and captured stderr on failure.
#[derive(Clone)]
pub struct ProcessRunner {
    inner: Arc<dyn CommandRunner>,
    dry_run: bool,
}

impl ProcessRunner {
    pub fn new(inner: Arc<dyn CommandRunner>) -> Self {
        Self {
            inner,
            dry_run: false,
        }
    }

    /// Marks the inner runner as one that never spawns anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command = invocation.command_line();
        match self.inner.run(invocation).await {
            Ok(output) if self.dry_run && output.success => {
                info!("Would run: {}", command);
                Ok(output)
            }
            Ok(output) if output.success => {
                info!("Command succeeded: {}", command);
                if !output.stdout.is_empty() {
                    println!("{}", output.stdout);
                }
                Ok(output)
            }
            Ok(output) => {
                error!("Command failed: {}", command);
                if !output.stderr.is_empty() {
                    eprintln!("{}", output.stderr);
                }
                Err(UpdaterError::CommandFailed {
                    command,
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                })
            }
            Err(e) => {
                error!("Error while running command: {}", e);
                Err(e)
            }
        }
    }

    /// Quiet run: true iff the command spawned and exited with status zero.
    pub async fn succeeds(&self, invocation: &Invocation) -> bool {
        match self.inner.run(invocation).await {
            Ok(output) => output.success,
            Err(e) => {
                debug!("Check `{}` did not run: {}", invocation, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_runner_scripts_failures() {
        let runner = RecordingRunner::new()
            .fail_on("platformio run", "compile error")
            .spawn_error_on("winget", "no shell");

        let ok = runner.run(&Invocation::new("git").arg("--version")).await.unwrap();
        assert!(ok.success);

        let failed = runner.run(&Invocation::new("platformio").arg("run")).await.unwrap();
        assert!(!failed.success);
        assert_eq!(failed.stderr, "compile error");

        let spawn = runner.run(&Invocation::new("winget").arg("install")).await;
        assert!(matches!(spawn, Err(UpdaterError::Spawn { .. })));

        assert_eq!(runner.invocations().len(), 3);
    }

    #[tokio::test]
    async fn process_runner_maps_nonzero_exit() {
        let recording = Arc::new(RecordingRunner::new().fail_on("upload", "no device"));
        let process = ProcessRunner::new(recording.clone());

        let err = process
            .run(&Invocation::new("platformio").args(["run", "--target", "upload"]))
            .await
            .unwrap_err();
        match err {
            UpdaterError::CommandFailed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "no device");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn succeeds_swallows_spawn_errors() {
        let process = ProcessRunner::new(Arc::new(
            RecordingRunner::new().spawn_error_on("python", "missing shell"),
        ));
        assert!(!process.succeeds(&Invocation::new("python").arg("--version")).await);
        assert!(process.succeeds(&Invocation::new("git").arg("--version")).await);
    }

    #[tokio::test]
    async fn dry_run_logs_without_success_output() {
        let recording = Arc::new(RecordingRunner::new().fail_on("upload", "no device"));
        let process = ProcessRunner::new(recording.clone()).dry_run(true);
        assert!(process.is_dry_run());
        assert!(!ProcessRunner::new(recording.clone()).is_dry_run());

        let output = process
            .run(&Invocation::new("platformio").arg("run"))
            .await
            .unwrap();
        assert!(output.success);

        // scripted failures still surface while dry running
        let err = process
            .run(&Invocation::new("platformio").args(["run", "--target", "upload"]))
            .await
            .unwrap_err();
        assert!(matches!(err, UpdaterError::CommandFailed { .. }));
        assert_eq!(recording.invocations().len(), 2);
    }
}
