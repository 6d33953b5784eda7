use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Presence of a required tool, derived from its version-check exit code.
pub type ToolStatus = bool;

/// Location of a discovered executable, if any.
pub type ToolPath = Option<PathBuf>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Toolchain,
    Sync,
    Compile,
    Flash,
    BuildFilesystem,
    FlashFilesystem,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Toolchain => "toolchain check",
            Stage::Sync => "repository sync",
            Stage::Compile => "compile",
            Stage::Flash => "firmware flash",
            Stage::BuildFilesystem => "filesystem build",
            Stage::FlashFilesystem => "filesystem flash",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    ToolchainChecked,
    RepoSynced,
    Compiled,
    Flashed,
    FilesystemBuilt,
    FilesystemFlashed,
    Failed(Stage),
}

impl PipelineState {
    /// State reached once `stage` has completed successfully.
    pub fn after(stage: Stage) -> Self {
        match stage {
            Stage::Toolchain => PipelineState::ToolchainChecked,
            Stage::Sync => PipelineState::RepoSynced,
            Stage::Compile => PipelineState::Compiled,
            Stage::Flash => PipelineState::Flashed,
            Stage::BuildFilesystem => PipelineState::FilesystemBuilt,
            Stage::FlashFilesystem => PipelineState::FilesystemFlashed,
        }
    }

    /// Applies the outcome of `stage`. Terminal states absorb every transition.
    pub fn advance(self, stage: Stage, success: bool) -> Self {
        if self.is_terminal() {
            return self;
        }
        if success {
            PipelineState::after(stage)
        } else {
            PipelineState::Failed(stage)
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::FilesystemFlashed | PipelineState::Failed(_)
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineState::FilesystemFlashed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum ToolAction {
    AlreadyInstalled,
    InstallAttempted { succeeded: bool },
    /// The installer itself could not be located, so nothing ran.
    InstallUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolReport {
    pub tool: String,
    pub action: ToolAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub id: Uuid,
    pub state: PipelineState,
    pub started_at: u64,
    pub completed_at: Option<u64>,
    pub tools: Vec<ToolReport>,
    pub stages: Vec<StageRecord>,
}

impl PipelineReport {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: PipelineState::Idle,
            started_at: unix_now(),
            completed_at: None,
            tools: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn record(&mut self, record: StageRecord) {
        self.state = self.state.advance(record.stage, record.success);
        self.stages.push(record);
    }

    pub fn finish(&mut self) {
        self.completed_at = Some(unix_now());
    }

    pub fn succeeded(&self) -> bool {
        self.state.is_success()
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

impl Default for PipelineReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A single external command: program, arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Plain space-joined form, for logs. Use `shell::render` for execution.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn from_output(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        }
    }

    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}
