#![allow(dead_code)]

use firmware_updater::config::{InstallMethod, PackageManager, ToolSpec, UpdaterConfig};
use firmware_updater::detection::executable_names;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPO_URL: &str = "https://github.com/MaskUp-Org/Embedded.git";

/// Config rooted in `root`: project in `root/Release`, runtime looked up in
/// `root/python`, build tool in `root/pio-bin`, `PATH` ignored.
pub fn test_config(root: &Path) -> UpdaterConfig {
    UpdaterConfig {
        repository_url: REPO_URL.to_string(),
        project_dir: root.join("Release"),
        remote: "origin".to_string(),
        branch: "main".to_string(),
        package_manager: PackageManager {
            program: "winget".to_string(),
            install_args: vec!["install".to_string()],
        },
        runtime: ToolSpec {
            name: "python".to_string(),
            executable: "python".to_string(),
            version_args: vec!["--version".to_string()],
            install: InstallMethod::PackageManager {
                package: "Python.Python.3.12".to_string(),
            },
            search_dirs: vec![root.join("python")],
        },
        vcs: ToolSpec {
            name: "git".to_string(),
            executable: "git".to_string(),
            version_args: vec!["--version".to_string()],
            install: InstallMethod::PackageManager {
                package: "Git.Git".to_string(),
            },
            search_dirs: Vec::new(),
        },
        build_tool: ToolSpec {
            name: "platformio".to_string(),
            executable: "platformio".to_string(),
            version_args: vec!["--version".to_string()],
            install: InstallMethod::RuntimeModule {
                args: ["-m", "pip", "install", "-U", "platformio"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            search_dirs: vec![root.join("pio-bin")],
        },
        build_environment: None,
        search_system_path: false,
        dry_run: false,
    }
}

/// Creates an empty file under `dir` with the platform's first executable name.
pub fn install_fake_tool(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(&executable_names(name)[0]);
    fs::write(&path, "").unwrap();
    path
}

pub fn install_build_tool(root: &Path) -> PathBuf {
    install_fake_tool(&root.join("pio-bin"), "platformio")
}

pub fn install_runtime(root: &Path) -> PathBuf {
    install_fake_tool(&root.join("python"), "python")
}

pub fn init_repository(root: &Path) {
    fs::create_dir_all(root.join("Release").join(".git")).unwrap();
}
