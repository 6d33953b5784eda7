pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod repository;
pub mod runner;
pub mod shell;
pub mod stages;
pub mod toolchain;

pub use crate::config::UpdaterConfig;
pub use crate::core::{PipelineReport, PipelineState, Stage};
pub use crate::detection::{Filesystem, OsFilesystem};
pub use crate::error::UpdaterError;
pub use crate::pipeline::Pipeline;
pub use crate::runner::{CommandRunner, ProcessRunner, RecordingRunner, ShellRunner};
