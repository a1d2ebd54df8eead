//! Wire protocol between remote clients and the bridge.
//!
//! Every message is a JSON object `{"type": ..., "content": ...}`.

use serde::{Deserialize, Serialize};

/// Messages sent from clients to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum InboundMessage {
    /// A reply to the pending question, e.g. `"2"` or `"two"`.
    Action(String),
    /// Free text to type into the assistant's prompt.
    Query(String),
}

/// A question and its options as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub text: String,
    pub options: Vec<String>,
}

/// Messages sent from the bridge to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// A question to answer (new, or re-asked after an invalid reply).
    Response(QuestionPayload),
    /// The requested action was carried out.
    Confirmation(String),
    /// The request could not be handled.
    Error(String),
}

impl OutboundMessage {
    pub fn response(text: impl Into<String>, options: Vec<String>) -> Self {
        OutboundMessage::Response(QuestionPayload {
            text: text.into(),
            options,
        })
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        OutboundMessage::Error(message.to_string())
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Response(_) => "response",
            OutboundMessage::Confirmation(_) => "confirmation",
            OutboundMessage::Error(_) => "error",
        }
    }
}
