use crate::error::{Result, UpdaterError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "UPDATER_CONFIG";
pub const REPO_URL_ENV: &str = "UPDATER_REPO_URL";
pub const PROJECT_DIR_ENV: &str = "UPDATER_PROJECT_DIR";
pub const BRANCH_ENV: &str = "UPDATER_BRANCH";
pub const BUILD_ENV_ENV: &str = "UPDATER_BUILD_ENV";
pub const DRY_RUN_ENV: &str = "UPDATER_DRY_RUN";

const DEFAULT_REPOSITORY_URL: &str = "https://github.com/MaskUp-Org/Embedded.git";

/// How a missing tool gets installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum InstallMethod {
    /// `<package manager> <install args> <package>`
    PackageManager { package: String },
    /// `<runtime executable> <args>`, the runtime being located by path discovery.
    RuntimeModule { args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub executable: String,
    pub version_args: Vec<String>,
    pub install: InstallMethod,
    /// Searched in order before `PATH`.
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManager {
    pub program: String,
    pub install_args: Vec<String>,
}

impl Default for PackageManager {
    fn default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(windows) {
            ("winget", &["install"])
        } else if cfg!(target_os = "macos") {
            ("brew", &["install"])
        } else {
            ("apt-get", &["install", "-y"])
        };
        Self {
            program: program.to_string(),
            install_args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    pub repository_url: String,
    pub project_dir: PathBuf,
    pub remote: String,
    pub branch: String,
    pub package_manager: PackageManager,
    pub runtime: ToolSpec,
    pub vcs: ToolSpec,
    pub build_tool: ToolSpec,
    /// PlatformIO environment passed as `-e` to every build-tool invocation.
    pub build_environment: Option<String>,
    /// Append the `PATH` entries to each tool's search directories.
    pub search_system_path: bool,
    pub dry_run: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            project_dir: PathBuf::from("Release"),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            package_manager: PackageManager::default(),
            runtime: default_runtime(&home),
            vcs: default_vcs(),
            build_tool: default_build_tool(&home),
            build_environment: None,
            search_system_path: true,
            dry_run: false,
        }
    }
}

fn python_home(home: &Path) -> PathBuf {
    home.join("AppData")
        .join("Local")
        .join("Programs")
        .join("Python")
        .join("Python312")
}

fn default_runtime(home: &Path) -> ToolSpec {
    let (executable, package, search_dirs) = if cfg!(windows) {
        ("python", "Python.Python.3.12", vec![python_home(home)])
    } else {
        (
            "python3",
            "python3",
            vec![
                home.join(".local").join("bin"),
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/usr/bin"),
            ],
        )
    };
    ToolSpec {
        name: "python".to_string(),
        executable: executable.to_string(),
        version_args: vec!["--version".to_string()],
        install: InstallMethod::PackageManager {
            package: package.to_string(),
        },
        search_dirs,
    }
}

fn default_vcs() -> ToolSpec {
    let package = if cfg!(windows) { "Git.Git" } else { "git" };
    ToolSpec {
        name: "git".to_string(),
        executable: "git".to_string(),
        version_args: vec!["--version".to_string()],
        install: InstallMethod::PackageManager {
            package: package.to_string(),
        },
        search_dirs: Vec::new(),
    }
}

fn default_build_tool(home: &Path) -> ToolSpec {
    let search_dirs = if cfg!(windows) {
        vec![
            python_home(home).join("Scripts"),
            home.join(".platformio").join("penv").join("Scripts"),
        ]
    } else {
        vec![
            home.join(".platformio").join("penv").join("bin"),
            home.join(".local").join("bin"),
            PathBuf::from("/usr/local/bin"),
        ]
    };
    ToolSpec {
        name: "platformio".to_string(),
        executable: "platformio".to_string(),
        version_args: vec!["--version".to_string()],
        install: InstallMethod::RuntimeModule {
            args: ["-m", "pip", "install", "-U", "platformio"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        },
        search_dirs,
    }
}

impl UpdaterConfig {
    /// Defaults, then the JSON file named by `UPDATER_CONFIG`, then the
    /// individual `UPDATER_*` overrides. A relative project directory is
    /// resolved against the current directory.
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| env::var(key).ok());

        if config.project_dir.is_relative() {
            let cwd = env::current_dir()
                .map_err(|e| UpdaterError::Config(format!("cannot read current directory: {e}")))?;
            config.project_dir = cwd.join(&config.project_dir);
        }

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            UpdaterError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| UpdaterError::Config(e.to_string()))
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(REPO_URL_ENV) {
            self.repository_url = url;
        }
        if let Some(dir) = lookup(PROJECT_DIR_ENV) {
            self.project_dir = PathBuf::from(dir);
        }
        if let Some(branch) = lookup(BRANCH_ENV) {
            self.branch = branch;
        }
        if let Some(build_env) = lookup(BUILD_ENV_ENV) {
            self.build_environment = Some(build_env).filter(|e| !e.is_empty());
        }
        if let Some(flag) = lookup(DRY_RUN_ENV) {
            self.dry_run = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repository_url.trim().is_empty() {
            return Err(UpdaterError::Config("repository_url is empty".to_string()));
        }
        if self.branch.trim().is_empty() {
            return Err(UpdaterError::Config("branch is empty".to_string()));
        }
        if self.package_manager.program.trim().is_empty() {
            return Err(UpdaterError::Config(
                "package_manager.program is empty".to_string(),
            ));
        }
        for tool in [&self.runtime, &self.vcs, &self.build_tool] {
            if tool.executable.trim().is_empty() {
                return Err(UpdaterError::Config(format!(
                    "{} has no executable name",
                    tool.name
                )));
            }
        }
        Ok(())
    }
}
