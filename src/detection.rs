use crate::config::{ToolSpec, UpdaterConfig};
use crate::core::ToolPath;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem access used by the pipeline. Tests substitute their own.
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// File names an executable called `name` may have on this platform.
pub fn executable_names(name: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{name}.exe"), format!("{name}.cmd"), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}

/// First `dir.join(name)` satisfying `exists`, directories taking priority
/// over names.
pub fn find_executable<F>(names: &[String], dirs: &[PathBuf], exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| exists(candidate))
}

/// Configured search directories followed by the `PATH` entries. Relative
/// entries are joined onto `base`, or dropped when there is no base, so every
/// candidate is absolute.
pub fn candidate_dirs(
    spec: &ToolSpec,
    path_var: Option<&OsStr>,
    base: Option<&Path>,
) -> Vec<PathBuf> {
    let path_entries = path_var
        .map(|value| std::env::split_paths(value).collect::<Vec<_>>())
        .unwrap_or_default();

    spec.search_dirs
        .iter()
        .cloned()
        .chain(path_entries)
        .filter(|p| !p.as_os_str().is_empty())
        .filter_map(|p| {
            if p.is_absolute() {
                Some(p)
            } else {
                base.map(|base| base.join(p))
            }
        })
        .collect()
}

fn system_path(config: &UpdaterConfig) -> Option<OsString> {
    if config.search_system_path {
        std::env::var_os("PATH")
    } else {
        None
    }
}

/// Searches the tool's search directories and, when enabled, `PATH`. The
/// environment is read on every call.
pub fn locate_tool(spec: &ToolSpec, config: &UpdaterConfig, fs: &dyn Filesystem) -> ToolPath {
    let path_var = system_path(config);
    let cwd = std::env::current_dir().ok();
    let dirs = candidate_dirs(spec, path_var.as_deref(), cwd.as_deref());
    let names = executable_names(&spec.executable);

    let found = find_executable(&names, &dirs, |p| fs.exists(p) && !fs.is_dir(p));
    match &found {
        Some(path) => debug!("Found {} at {}", spec.name, path.display()),
        None => debug!("{} not found in {} directories", spec.name, dirs.len()),
    }
    found
}

/// Number of locations `locate_tool` would check, for error reporting.
pub fn searched_locations(spec: &ToolSpec, config: &UpdaterConfig) -> usize {
    let path_var = system_path(config);
    let cwd = std::env::current_dir().ok();
    candidate_dirs(spec, path_var.as_deref(), cwd.as_deref()).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallMethod;
    use std::collections::HashSet;

    fn spec(dirs: &[&str]) -> ToolSpec {
        ToolSpec {
            name: "platformio".to_string(),
            executable: "platformio".to_string(),
            version_args: vec!["--version".to_string()],
            install: InstallMethod::PackageManager {
                package: "platformio".to_string(),
            },
            search_dirs: dirs.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn first_existing_directory_wins() {
        let dirs = vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")];
        let present: HashSet<PathBuf> =
            [PathBuf::from("/b/pio"), PathBuf::from("/c/pio")].into_iter().collect();

        let found = find_executable(&["pio".to_string()], &dirs, |p| present.contains(p));
        assert_eq!(found, Some(PathBuf::from("/b/pio")));
    }

    #[test]
    fn names_tried_in_order_within_a_directory() {
        let dirs = vec![PathBuf::from("/bin")];
        let names = vec!["pio.exe".to_string(), "pio".to_string()];
        let found = find_executable(&names, &dirs, |p| p.ends_with("pio") || p.ends_with("pio.exe"));
        assert_eq!(found, Some(PathBuf::from("/bin/pio.exe")));
    }

    #[test]
    fn nothing_exists() {
        let dirs = vec![PathBuf::from("/a")];
        assert_eq!(find_executable(&["pio".to_string()], &dirs, |_| false), None);
    }

    #[test]
    fn path_entries_follow_configured_dirs() {
        let joined = std::env::join_paths(["/usr/bin", "/opt/bin"]).unwrap();
        let dirs = candidate_dirs(&spec(&["/first"]), Some(joined.as_os_str()), None);
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/first"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/opt/bin")
            ]
        );
    }

    #[test]
    fn no_path_var_means_configured_dirs_only() {
        let dirs = candidate_dirs(&spec(&["/first", "/second"]), None, None);
        assert_eq!(dirs.len(), 2);
    }

    #[test]
    fn relative_path_entries_resolve_against_base() {
        let base = std::env::temp_dir();
        let joined = std::env::join_paths([".", "tools/bin"]).unwrap();
        let dirs = candidate_dirs(&spec(&["local"]), Some(joined.as_os_str()), Some(&base));

        assert_eq!(
            dirs,
            vec![base.join("local"), base.join("."), base.join("tools/bin")]
        );
        assert!(dirs.iter().all(|d| d.is_absolute()));
    }

    #[test]
    fn relative_path_entries_dropped_without_base() {
        let absolute = std::env::temp_dir();
        let joined = std::env::join_paths([PathBuf::from("bin"), absolute.clone()]).unwrap();
        let dirs = candidate_dirs(&spec(&[]), Some(joined.as_os_str()), None);
        assert_eq!(dirs, vec![absolute]);
    }

    #[test]
    fn located_tool_is_absolute_for_relative_path_entry() {
        let cwd = std::env::current_dir().unwrap();
        let relative = PathBuf::from("target");
        let dirs = candidate_dirs(&spec(&[]), Some(relative.as_os_str()), Some(&cwd));
        let expected = cwd.join("target").join("platformio");

        let found = find_executable(&["platformio".to_string()], &dirs, |p| p == expected);
        assert_eq!(found.as_deref(), Some(expected.as_path()));
        assert!(found.unwrap().is_absolute());
    }
}
