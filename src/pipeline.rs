use crate::config::UpdaterConfig;
use crate::core::{duration_ms, PipelineReport, Stage, StageRecord};
use crate::detection::{Filesystem, OsFilesystem};
use crate::error::{Result, UpdaterError};
use crate::repository;
use crate::runner::{CommandRunner, ProcessRunner, RecordingRunner, ShellRunner};
use crate::stages::{self, BuildTarget};
use crate::toolchain;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub struct Pipeline {
    config: UpdaterConfig,
    process: ProcessRunner,
    fs: Arc<dyn Filesystem>,
}

impl Pipeline {
    pub fn new(config: UpdaterConfig, runner: Arc<dyn CommandRunner>, fs: Arc<dyn Filesystem>) -> Self {
        let process = ProcessRunner::new(runner).dry_run(config.dry_run);
        Self {
            config,
            process,
            fs,
        }
    }

    /// Real shell and filesystem, or a `RecordingRunner` when `dry_run` is
    /// set. The recorder is returned so the caller can list what would run.
    pub fn from_config(config: UpdaterConfig) -> (Self, Option<Arc<RecordingRunner>>) {
        let recorder = config.dry_run.then(|| Arc::new(RecordingRunner::new()));
        let runner: Arc<dyn CommandRunner> = match &recorder {
            Some(recorder) => {
                info!("Dry run: commands are printed, not executed");
                recorder.clone() as Arc<dyn CommandRunner>
            }
            None => Arc::new(ShellRunner::new()),
        };
        (Self::new(config, runner, Arc::new(OsFilesystem)), recorder)
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Runs every stage in order and stops at the first failing one. Never
    /// fails itself: the outcome is in the returned report.
    pub async fn run(&self) -> PipelineReport {
        let mut report = PipelineReport::new();
        info!(run_id = %report.id, "Starting firmware update");

        let started = Instant::now();
        report.tools =
            toolchain::ensure_toolchain(&self.process, &self.config, self.fs.as_ref()).await;
        report.record(StageRecord {
            stage: Stage::Toolchain,
            success: true,
            error: None,
            duration_ms: duration_ms(started.elapsed()),
        });

        let synced = self
            .stage(&mut report, Stage::Sync, async {
                repository::ensure_project_dir(&self.config.project_dir, self.fs.as_ref())?;
                repository::sync_repository(&self.process, &self.config, self.fs.as_ref()).await?;
                Ok::<(), UpdaterError>(())
            })
            .await;

        if synced {
            for target in BuildTarget::ALL {
                let ok = self
                    .stage(
                        &mut report,
                        target.stage(),
                        stages::run_target(&self.process, target, &self.config, self.fs.as_ref()),
                    )
                    .await;
                if !ok {
                    break;
                }
            }
        }

        report.finish();
        if report.succeeded() {
            info!(run_id = %report.id, "Firmware and filesystem image flashed successfully.");
        } else {
            error!(run_id = %report.id, state = ?report.state, "Firmware update did not complete.");
        }
        report
    }

    async fn stage<F>(&self, report: &mut PipelineReport, stage: Stage, work: F) -> bool
    where
        F: Future<Output = Result<()>>,
    {
        let started = Instant::now();
        let outcome = work.await;
        let elapsed_ms = duration_ms(started.elapsed());

        let (success, error) = match outcome {
            Ok(()) => (true, None),
            Err(e) => {
                error!("{} failed: {}", capitalize(&stage.to_string()), e);
                (false, Some(e.to_string()))
            }
        };
        report.record(StageRecord {
            stage,
            success,
            error,
            duration_ms: elapsed_ms,
        });
        success
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
