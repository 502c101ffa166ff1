//! Service reload trigger.
//!
//! # Design Decisions
//! - Reload is a single awaited call with no timeout; a hanging command
//!   blocks the operation that triggered it
//! - Failure is reported only through `Err`, never through a status value
//! - A non-zero exit status counts as failure

use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors raised by a reload trigger.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The reload command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The reload command ran but reported failure.
    #[error("{program} exited with {status}")]
    ExitStatus { program: String, status: ExitStatus },

    /// Any other reload failure.
    #[error("reload failed: {0}")]
    Other(String),
}

/// Makes a persisted configuration take effect in the running proxy.
#[async_trait]
pub trait Reloader: Send + Sync {
    async fn reload(&self) -> Result<(), ReloadError>;
}

/// Runs an external command, `systemctl restart xray` by default.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    program: String,
    args: Vec<String>,
}

impl CommandReloader {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from an argv list. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

#[async_trait]
impl Reloader for CommandReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        tracing::debug!(program = %self.program, args = ?self.args, "Reloading xray");

        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|source| ReloadError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ReloadError::ExitStatus {
                program: self.program.clone(),
                status,
            })
        }
    }
}
