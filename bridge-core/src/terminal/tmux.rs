//! Key injection through `tmux send-keys`.

use super::{KeyCommand, TerminalConfig, TerminalInjector};
use crate::error::InjectionError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Sends keys to a tmux target running the assistant.
#[derive(Debug, Clone)]
pub struct TmuxInjector {
    binary: String,
    target: String,
    key_delay: Duration,
}

impl TmuxInjector {
    pub fn new(binary: impl Into<String>, target: impl Into<String>, key_delay: Duration) -> Self {
        Self {
            binary: binary.into(),
            target: target.into(),
            key_delay,
        }
    }

    pub fn from_config(config: &TerminalConfig) -> Self {
        Self::new(
            config.tmux_binary.clone(),
            config.tmux_target.clone(),
            Duration::from_millis(config.key_delay_ms),
        )
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    async fn run(&self, args: Vec<String>) -> Result<(), InjectionError> {
        debug!(binary = %self.binary, ?args, "Running tmux");
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|source| InjectionError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(target = %self.target, stderr = %stderr, "tmux send-keys failed");
        Err(InjectionError::CommandFailed {
            command: format!("{} {}", self.binary, args.join(" ")),
            status: output.status.code().unwrap_or(-1),
            stderr,
        })
    }
}

/// Arguments for `tmux send-keys` with named keys.
pub fn send_keys_args(target: &str, keys: &[&str]) -> Vec<String> {
    let mut args = vec!["send-keys".to_string(), "-t".to_string(), target.to_string()];
    args.extend(keys.iter().map(|k| k.to_string()));
    args
}

/// Arguments for `tmux send-keys -l`, which types `text` without key-name lookup.
pub fn send_literal_args(target: &str, text: &str) -> Vec<String> {
    vec![
        "send-keys".to_string(),
        "-t".to_string(),
        target.to_string(),
        "-l".to_string(),
        text.to_string(),
    ]
}

#[async_trait]
impl TerminalInjector for TmuxInjector {
    fn name(&self) -> &str {
        "tmux"
    }

    async fn inject(&self, command: &KeyCommand) -> Result<(), InjectionError> {
        if let Some(text) = command.literal_text() {
            if text.trim().is_empty() {
                return Err(InjectionError::EmptyCommand {
                    reason: "literal text is blank".into(),
                });
            }
            self.run(send_literal_args(&self.target, text)).await?;
        }

        let keys = command.keys();
        if self.key_delay.is_zero() {
            return self.run(send_keys_args(&self.target, &keys)).await;
        }

        // The assistant's menu redraws between presses; pace them.
        for key in keys {
            tokio::time::sleep(self.key_delay).await;
            self.run(send_keys_args(&self.target, &[key])).await?;
        }
        Ok(())
    }
}
