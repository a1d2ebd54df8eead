//! Injector that only logs and records what it would press.

use super::{KeyCommand, TerminalInjector};
use crate::error::InjectionError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::info;

/// Commands kept by [`DryRunInjector::new`].
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Records recent commands instead of touching a terminal.
///
/// Only the newest `limit` commands are kept, so a long-running
/// `serve --dry-run` stays bounded.
#[derive(Debug)]
pub struct DryRunInjector {
    history: Mutex<VecDeque<KeyCommand>>,
    limit: usize,
}

impl Default for DryRunInjector {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl DryRunInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT))),
            limit,
        }
    }

    /// Retained commands, oldest first.
    pub fn history(&self) -> Vec<KeyCommand> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TerminalInjector for DryRunInjector {
    fn name(&self) -> &str {
        "dry_run"
    }

    async fn inject(&self, command: &KeyCommand) -> Result<(), InjectionError> {
        info!(%command, "Dry run: would inject keys");
        if self.limit == 0 {
            return Ok(());
        }
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if history.len() == self.limit {
            history.pop_front();
        }
        history.push_back(command.clone());
        Ok(())
    }
}
