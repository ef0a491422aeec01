//! External data source that produces usage payloads.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::parser::ParseError;
use crate::config::DataSourceSettings;

/// Transport-level failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The data source could not be started
    LaunchFailure,
    /// The data source started but its output was unusable
    IoFailure,
}

/// Error type for a failed fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The command could not be spawned (missing binary, permissions)
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the command's output failed
    #[error("I/O error while reading usage data: {0}")]
    Io(#[from] std::io::Error),

    /// The command exited unsuccessfully
    #[error("usage command exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    /// The session exceeded its configured time limit
    #[error("usage command timed out after {0:?}")]
    Timeout(Duration),

    /// The output could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Category used for presentation
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Launch { .. } => FetchErrorKind::LaunchFailure,
            FetchError::Io(_)
            | FetchError::Exit { .. }
            | FetchError::Timeout(_)
            | FetchError::Parse(_) => FetchErrorKind::IoFailure,
        }
    }
}

/// Something that produces one raw usage payload per call.
///
/// Implementations must stop their work when the returned future is
/// dropped; sessions rely on this for cancellation.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Run the source once and return its standard output
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Runs an external command and captures its standard output.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSource {
    /// Create a source for `program` with fixed arguments
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Create a source from the `[data_source]` settings table
    pub fn from_settings(settings: &DataSourceSettings) -> Self {
        Self::new(&settings.command, settings.args.clone())
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

#[async_trait]
impl UsageSource for CommandSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Launch {
                program: self.program_name(),
                source,
            })?;

        debug!(program = %self.program_name(), pid = ?child.id(), "Usage command started");

        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            debug!(stderr = %stderr, "Usage command wrote to stderr");
        }

        if !output.status.success() {
            return Err(FetchError::Exit {
                status: output.status.to_string(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|e| {
            FetchError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let source = CommandSource::new("/nonexistent/aimon-fetch-usage", Vec::new());
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::LaunchFailure);
        assert!(err.to_string().contains("/nonexistent/aimon-fetch-usage"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), r#"printf '{"claude":{"installed":true}}'"#.to_string()],
        );
        let out = source.fetch().await.unwrap();
        assert_eq!(out, r#"{"claude":{"installed":true}}"#);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_io_failure() {
        let source = CommandSource::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
        );
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::IoFailure);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_from_settings() {
        let settings = DataSourceSettings {
            command: "python3".to_string(),
            args: vec!["fetch_all_usage.py".to_string()],
            timeout_secs: None,
        };
        let source = CommandSource::from_settings(&settings);
        assert_eq!(source.program, PathBuf::from("python3"));
        assert_eq!(source.args, vec!["fetch_all_usage.py".to_string()]);
    }
}
