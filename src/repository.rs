use crate::config::UpdaterConfig;
use crate::core::Invocation;
use crate::detection::Filesystem;
use crate::error::{Result, UpdaterError};
use crate::runner::ProcessRunner;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Clone,
    Pull,
}

pub fn has_repository(project_dir: &Path, fs: &dyn Filesystem) -> bool {
    fs.is_dir(&project_dir.join(".git"))
}

pub fn plan_sync(config: &UpdaterConfig, fs: &dyn Filesystem) -> (SyncAction, Invocation) {
    let git = config.vcs.executable.clone();
    if has_repository(&config.project_dir, fs) {
        let pull = Invocation::new(git)
            .args(["pull", config.remote.as_str(), config.branch.as_str()])
            .current_dir(&config.project_dir);
        (SyncAction::Pull, pull)
    } else {
        let clone = Invocation::new(git)
            .arg("clone")
            .arg(config.repository_url.clone())
            .arg(config.project_dir.to_string_lossy().into_owned());
        (SyncAction::Clone, clone)
    }
}

pub fn ensure_project_dir(project_dir: &Path, fs: &dyn Filesystem) -> Result<()> {
    if fs.is_dir(project_dir) {
        return Ok(());
    }
    info!("Creating project directory {}", project_dir.display());
    fs.create_dir_all(project_dir)
        .map_err(|source| UpdaterError::ProjectDir {
            path: project_dir.to_path_buf(),
            source,
        })
}

/// Pulls the configured branch when the project directory already holds a
/// repository, clones it otherwise.
pub async fn sync_repository(
    process: &ProcessRunner,
    config: &UpdaterConfig,
    fs: &dyn Filesystem,
) -> Result<SyncAction> {
    let (action, invocation) = plan_sync(config, fs);
    match action {
        SyncAction::Pull => info!("Pulling latest changes..."),
        SyncAction::Clone => info!("Cloning repository..."),
    }
    process.run(&invocation).await?;
    Ok(action)
}
