use crate::config::{InstallMethod, ToolSpec, UpdaterConfig};
use crate::core::{Invocation, ToolAction, ToolReport, ToolStatus};
use crate::detection::{self, Filesystem};
use crate::runner::ProcessRunner;
use tracing::{info, warn};

pub fn version_check(spec: &ToolSpec) -> Invocation {
    Invocation::new(spec.executable.clone()).args(spec.version_args.iter().cloned())
}

pub async fn is_tool_installed(process: &ProcessRunner, spec: &ToolSpec) -> ToolStatus {
    process.succeeds(&version_check(spec)).await
}

/// Install command for `spec`, or `None` when its installer cannot be found.
pub fn install_invocation(
    spec: &ToolSpec,
    config: &UpdaterConfig,
    fs: &dyn Filesystem,
) -> Option<Invocation> {
    match &spec.install {
        InstallMethod::PackageManager { package } => Some(
            Invocation::new(config.package_manager.program.clone())
                .args(config.package_manager.install_args.iter().cloned())
                .arg(package.clone()),
        ),
        InstallMethod::RuntimeModule { args } => {
            let runtime = detection::locate_tool(&config.runtime, config, fs)?;
            Some(
                Invocation::new(runtime.to_string_lossy().into_owned())
                    .args(args.iter().cloned()),
            )
        }
    }
}

/// Installs `spec` if its version check fails. The install is not
/// re-verified and its failure does not stop the caller.
pub async fn install_if_missing(
    process: &ProcessRunner,
    spec: &ToolSpec,
    config: &UpdaterConfig,
    fs: &dyn Filesystem,
) -> ToolAction {
    if is_tool_installed(process, spec).await {
        info!("{} is already installed.", spec.name);
        return ToolAction::AlreadyInstalled;
    }

    let Some(install) = install_invocation(spec, config, fs) else {
        warn!(
            "{} is not installed and {} could not be found to install it.",
            spec.name, config.runtime.name
        );
        return ToolAction::InstallUnavailable;
    };

    info!("{} is not installed. Installing...", spec.name);
    let succeeded = match process.run(&install).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Installing {} failed: {}", spec.name, e);
            false
        }
    };
    ToolAction::InstallAttempted { succeeded }
}

/// Runtime, VCS client, then build tool.
pub async fn ensure_toolchain(
    process: &ProcessRunner,
    config: &UpdaterConfig,
    fs: &dyn Filesystem,
) -> Vec<ToolReport> {
    let mut reports = Vec::with_capacity(3);
    for spec in [&config.runtime, &config.vcs, &config.build_tool] {
        let action = install_if_missing(process, spec, config, fs).await;
        reports.push(ToolReport {
            tool: spec.name.clone(),
            action,
        });
    }
    reports
}
