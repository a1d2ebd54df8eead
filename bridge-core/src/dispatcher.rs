//! Per-session coordinator between the wire protocol, the selection core and
//! the terminal injector.
//!
//! One dispatcher exists per client session and owns that session's pending
//! question. The gateway feeds it one message at a time, in arrival order, so
//! a client retrying after an invalid reply always retries against the same
//! options.

use crate::error::ProtocolError;
use crate::gateway::{InboundMessage, OutboundMessage};
use crate::selection::{resolve, ActionOutcome, OptionRegistry, PendingQuestion};
use crate::terminal::{KeyCommand, TerminalInjector};
use std::sync::Arc;
use tracing::{info, warn};

/// Handles inbound messages for a single session.
pub struct SessionDispatcher {
    registry: OptionRegistry,
    injector: Arc<dyn TerminalInjector>,
}

impl std::fmt::Debug for SessionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDispatcher")
            .field("injector", &self.injector.name())
            .field("pending", &self.registry.has_pending())
            .finish()
    }
}

impl SessionDispatcher {
    pub fn new(injector: Arc<dyn TerminalInjector>) -> Self {
        Self {
            registry: OptionRegistry::new(),
            injector,
        }
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    /// Install a question from the assistant and build the `response` that
    /// presents it to the client.
    pub fn present_question(
        &self,
        text: impl Into<String>,
        options: Vec<String>,
    ) -> Result<OutboundMessage, ProtocolError> {
        if options.is_empty() {
            return Err(ProtocolError::EmptyOptions);
        }
        let question = self.registry.set_question(text, options);
        info!(options = question.len(), "Presenting question");
        Ok(OutboundMessage::response(
            question.text.clone(),
            question.options.clone(),
        ))
    }

    /// Decode a raw text frame and handle it. Malformed frames become `error`
    /// messages; nothing is dropped.
    pub async fn handle_text(&self, raw: &str) -> OutboundMessage {
        match serde_json::from_str::<InboundMessage>(raw) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                let err = ProtocolError::MalformedEnvelope {
                    message: e.to_string(),
                };
                warn!(error = %err, "Rejected inbound frame");
                OutboundMessage::error(err)
            }
        }
    }

    /// Handle one decoded message and produce exactly one reply.
    pub async fn handle_message(&self, msg: InboundMessage) -> OutboundMessage {
        match msg {
            InboundMessage::Action(content) => self.handle_action(&content).await,
            InboundMessage::Query(text) => self.handle_query(&text).await,
        }
    }

    async fn handle_action(&self, content: &str) -> OutboundMessage {
        let Some(question) = self.registry.current() else {
            warn!(input = content, "Action received with no pending question");
            return OutboundMessage::error(ProtocolError::NoPendingQuestion);
        };

        let outcome = resolve(content, &question);
        match &outcome {
            ActionOutcome::Selected { index, option } => {
                self.confirm_selection(&question, *index, option).await
            }
            ActionOutcome::OutOfRange { .. } | ActionOutcome::Unparsable { .. } => {
                let prompt = outcome.retry_prompt().unwrap_or_default();
                info!(input = content, "Invalid selection, asking again");
                OutboundMessage::response(prompt, question.options.clone())
            }
        }
    }

    async fn confirm_selection(
        &self,
        question: &Arc<PendingQuestion>,
        index: usize,
        option: &str,
    ) -> OutboundMessage {
        let command = KeyCommand::Select {
            down_presses: index - 1,
        };
        if let Err(e) = self.injector.inject(&command).await {
            warn!(injector = self.injector.name(), error = %e, "Selection injection failed");
            return OutboundMessage::error(format!("Failed to select option {}: {}", index, e));
        }

        // The assistant's menu is gone once answered; only clear if no newer
        // question was installed while the keys were in flight.
        self.registry.clear_if(question);

        info!(index, option, "Selected option");
        OutboundMessage::Confirmation(format!("Selected option {}: {}", index, option))
    }

    async fn handle_query(&self, text: &str) -> OutboundMessage {
        let text = text.trim();
        if text.is_empty() {
            return OutboundMessage::error(ProtocolError::EmptyQuery);
        }

        let command = KeyCommand::Type {
            text: text.to_string(),
        };
        match self.injector.inject(&command).await {
            Ok(()) => {
                info!(chars = text.len(), "Query sent to terminal");
                OutboundMessage::Confirmation("Query sent to terminal".to_string())
            }
            Err(e) => {
                warn!(injector = self.injector.name(), error = %e, "Query injection failed");
                OutboundMessage::error(format!("Failed to send query: {}", e))
            }
        }
    }
}
