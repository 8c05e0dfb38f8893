use std::{fmt, io, process::Output};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::warn;

/// Addressable handle of the controlled process, e.g. an X11 window id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub String);

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target not found: {0}")]
    NotFound(String),
    #[error("primitive action failed: {0}")]
    ActionFailed(String),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },
}

/// The collaborator that locates the target and performs one primitive action.
///
/// Implementations are called one action at a time; `invoke_primitive_action`
/// returns only after the action's effect window has elapsed.
#[async_trait]
pub trait TargetController: Send + Sync {
    async fn resolve_target_handle(&self) -> Result<TargetHandle, TargetError>;
    async fn invoke_primitive_action(
        &self,
        handle: &TargetHandle,
        target_key: &str,
    ) -> Result<(), TargetError>;
}

const XDOTOOL: &str = "xdotool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XdotoolConfig {
    pub window_class: String,
    pub key_delay_ms: u64,
}

impl Default for XdotoolConfig {
    fn default() -> Self {
        Self {
            window_class: "vbam".into(),
            key_delay_ms: 100,
        }
    }
}

/// Drives an X11 window through the `xdotool` binary.
#[derive(Debug, Clone, Default)]
pub struct XdotoolController {
    config: XdotoolConfig,
}

impl XdotoolController {
    pub fn new(config: XdotoolConfig) -> Self {
        Self { config }
    }

    pub fn search_args(&self) -> Vec<String> {
        vec![
            "search".into(),
            "--class".into(),
            self.config.window_class.clone(),
        ]
    }

    pub fn key_args(&self, handle: &TargetHandle, target_key: &str) -> Vec<String> {
        vec![
            "key".into(),
            "--clearmodifiers".into(),
            "--delay".into(),
            self.config.key_delay_ms.to_string(),
            "--window".into(),
            handle.0.clone(),
            target_key.into(),
        ]
    }

    async fn run(&self, args: Vec<String>) -> Result<Output, TargetError> {
        Command::new(XDOTOOL)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TargetError::Spawn {
                program: XDOTOOL,
                source,
            })
    }
}

/// First window id printed by `xdotool search`, if any.
pub fn first_window_id(stdout: &str) -> Option<TargetHandle> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| TargetHandle(line.to_string()))
}

#[async_trait]
impl TargetController for XdotoolController {
    async fn resolve_target_handle(&self) -> Result<TargetHandle, TargetError> {
        let output = self.run(self.search_args()).await?;
        first_window_id(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            TargetError::NotFound(format!(
                "no window with class '{}'",
                self.config.window_class
            ))
        })
    }

    async fn invoke_primitive_action(
        &self,
        handle: &TargetHandle,
        target_key: &str,
    ) -> Result<(), TargetError> {
        let output = self.run(self.key_args(handle, target_key)).await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !output.status.success() {
            return Err(TargetError::ActionFailed(format!(
                "xdotool exited with {}: {stderr}",
                output.status
            )));
        }
        if !stderr.is_empty() {
            warn!(%handle, target_key, stderr, "xdotool reported warnings");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
