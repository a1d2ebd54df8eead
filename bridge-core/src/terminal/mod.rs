//! # Terminal Injection
//!
//! The boundary to the terminal session hosting the coding assistant. The
//! dispatcher decides *what* to press; an injector decides *how* the keys
//! reach the terminal.

pub mod dry_run;
pub mod tmux;

pub use dry_run::DryRunInjector;
pub use tmux::TmuxInjector;

use crate::error::InjectionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A keystroke sequence to deliver to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyCommand {
    /// Move the menu cursor down `down_presses` times, then confirm.
    Select { down_presses: usize },
    /// Type literal text into the prompt, then submit it.
    Type { text: String },
}

impl KeyCommand {
    /// tmux key names for the non-literal part of the command, in order.
    pub fn keys(&self) -> Vec<&'static str> {
        match self {
            KeyCommand::Select { down_presses } => {
                let mut keys = vec!["Down"; *down_presses];
                keys.push("Enter");
                keys
            }
            KeyCommand::Type { .. } => vec!["Enter"],
        }
    }

    /// Text to send literally before the keys, if any.
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            KeyCommand::Select { .. } => None,
            KeyCommand::Type { text } => Some(text),
        }
    }
}

impl std::fmt::Display for KeyCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyCommand::Select { down_presses } => {
                write!(f, "press Down {} times, then Enter", down_presses)
            }
            KeyCommand::Type { text } => write!(f, "type {:?}, then Enter", text),
        }
    }
}

/// Delivers key commands to the assistant's terminal.
#[async_trait]
pub trait TerminalInjector: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Deliver `command`. Returns once the keys have been handed to the terminal.
    async fn inject(&self, command: &KeyCommand) -> Result<(), InjectionError>;
}

/// Which injector backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectorBackend {
    #[default]
    Tmux,
    DryRun,
}

impl std::fmt::Display for InjectorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectorBackend::Tmux => write!(f, "tmux"),
            InjectorBackend::DryRun => write!(f, "dry_run"),
        }
    }
}

/// Configuration for the terminal side of the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Injector backend.
    pub backend: InjectorBackend,
    /// Path or name of the tmux executable.
    pub tmux_binary: String,
    /// tmux target (session, window or pane) running the assistant.
    pub tmux_target: String,
    /// Pause between individual keys, in milliseconds (0 sends all keys at once).
    pub key_delay_ms: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            backend: InjectorBackend::Tmux,
            tmux_binary: "tmux".to_string(),
            tmux_target: "claude".to_string(),
            key_delay_ms: 50,
        }
    }
}

/// Build the injector selected by `config`.
pub fn build_injector(config: &TerminalConfig) -> Arc<dyn TerminalInjector> {
    match config.backend {
        InjectorBackend::Tmux => Arc::new(TmuxInjector::from_config(config)),
        InjectorBackend::DryRun => Arc::new(DryRunInjector::new()),
    }
}
