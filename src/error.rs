use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {}", display_code(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} executable not found ({searched} locations searched)")]
    ToolNotFound { tool: String, searched: usize },

    #[error("failed to create project directory {}: {source}", .path.display())]
    ProjectDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown (terminated by signal)".to_string())
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
