use crate::config::UpdaterConfig;
use crate::core::{Invocation, Stage};
use crate::detection::{self, Filesystem};
use crate::error::{Result, UpdaterError};
use crate::runner::ProcessRunner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Build-tool subcommands, each run in the project directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Compile,
    Flash,
    BuildFilesystem,
    FlashFilesystem,
}

impl BuildTarget {
    pub const ALL: [BuildTarget; 4] = [
        BuildTarget::Compile,
        BuildTarget::Flash,
        BuildTarget::BuildFilesystem,
        BuildTarget::FlashFilesystem,
    ];

    pub fn stage(self) -> Stage {
        match self {
            BuildTarget::Compile => Stage::Compile,
            BuildTarget::Flash => Stage::Flash,
            BuildTarget::BuildFilesystem => Stage::BuildFilesystem,
            BuildTarget::FlashFilesystem => Stage::FlashFilesystem,
        }
    }

    pub fn args(self) -> &'static [&'static str] {
        match self {
            BuildTarget::Compile => &["run"],
            BuildTarget::Flash => &["run", "--target", "upload"],
            BuildTarget::BuildFilesystem => &["run", "--target", "buildfs"],
            BuildTarget::FlashFilesystem => &["run", "--target", "uploadfs"],
        }
    }

    fn banner(self) -> &'static str {
        match self {
            BuildTarget::Compile => "Compiling project...",
            BuildTarget::Flash => "Uploading firmware to device...",
            BuildTarget::BuildFilesystem => "Building filesystem image...",
            BuildTarget::FlashFilesystem => "Uploading filesystem image to device...",
        }
    }
}

pub fn build_invocation(
    tool: &Path,
    target: BuildTarget,
    config: &UpdaterConfig,
) -> Invocation {
    let mut invocation = Invocation::new(tool.to_string_lossy().into_owned())
        .args(target.args().iter().copied())
        .current_dir(&config.project_dir);
    if let Some(env) = &config.build_environment {
        invocation = invocation.args(["-e", env.as_str()]);
    }
    invocation
}

/// Locates the build tool afresh and runs `target`. Nothing is spawned when
/// the tool cannot be found.
pub async fn run_target(
    process: &ProcessRunner,
    target: BuildTarget,
    config: &UpdaterConfig,
    fs: &dyn Filesystem,
) -> Result<()> {
    let tool = match detection::locate_tool(&config.build_tool, config, fs) {
        Some(tool) => tool,
        // a dry run has nothing installed yet; show the command by name
        None if process.is_dry_run() => PathBuf::from(&config.build_tool.executable),
        None => {
            return Err(UpdaterError::ToolNotFound {
                tool: config.build_tool.name.clone(),
                searched: detection::searched_locations(&config.build_tool, config),
            })
        }
    };

    info!("{}", target.banner());
    process.run(&build_invocation(&tool, target, config)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_map_to_subcommands() {
        let config = UpdaterConfig {
            project_dir: PathBuf::from("/work/Release"),
            ..UpdaterConfig::default()
        };
        let lines: Vec<String> = BuildTarget::ALL
            .iter()
            .map(|t| build_invocation(Path::new("pio"), *t, &config).command_line())
            .collect();
        assert_eq!(
            lines,
            vec![
                "pio run",
                "pio run --target upload",
                "pio run --target buildfs",
                "pio run --target uploadfs",
            ]
        );
    }

    #[test]
    fn build_environment_is_appended() {
        let config = UpdaterConfig {
            project_dir: PathBuf::from("/work/Release"),
            build_environment: Some("esp32dev".to_string()),
            ..UpdaterConfig::default()
        };
        let inv = build_invocation(Path::new("pio"), BuildTarget::Flash, &config);
        assert_eq!(inv.command_line(), "pio run --target upload -e esp32dev");
        assert_eq!(inv.working_dir, Some(PathBuf::from("/work/Release")));
    }
}
