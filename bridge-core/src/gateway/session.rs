//! Gateway session lifecycle.

use super::connection::ConnectionManager;
use super::events::OutboundMessage;
use crate::dispatcher::SessionDispatcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// State of a gateway session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Ended,
}

/// A client session: one dispatcher plus the channel feeding its socket writer.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub session_id: Uuid,
    pub connection_id: Uuid,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    dispatcher: Arc<SessionDispatcher>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl GatewaySession {
    pub fn dispatcher(&self) -> &Arc<SessionDispatcher> {
        &self.dispatcher
    }

    /// A new handle to the session's outbound channel.
    pub fn sender(&self) -> mpsc::UnboundedSender<OutboundMessage> {
        self.outbound.clone()
    }

    /// Queue a message for the client. Returns `false` if the socket is gone.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        self.outbound.send(msg).is_ok()
    }
}

/// Serializable view of a session for the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub connection_id: Uuid,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    /// Last inbound frame on the session's connection.
    pub last_activity: Option<DateTime<Utc>>,
    pub pending_question: Option<String>,
}

/// Owns all gateway sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<Uuid, GatewaySession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a connection. The returned receiver yields every
    /// message addressed to the session, in send order.
    pub fn create_session(
        &mut self,
        connection_id: Uuid,
        dispatcher: Arc<SessionDispatcher>,
    ) -> (Uuid, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let now = Utc::now();
        let session_id = Uuid::new_v4();
        self.sessions.insert(
            session_id,
            GatewaySession {
                session_id,
                connection_id,
                state: SessionState::Active,
                created_at: now,
                updated_at: now,
                dispatcher,
                outbound: tx,
            },
        );
        (session_id, rx)
    }

    /// End a session. Returns `false` if it is unknown or already ended.
    pub fn end_session(&mut self, session_id: &Uuid) -> bool {
        if let Some(session) = self.sessions.get_mut(session_id) {
            if session.state != SessionState::Ended {
                session.state = SessionState::Ended;
                session.updated_at = Utc::now();
                return true;
            }
        }
        false
    }

    pub fn get(&self, session_id: &Uuid) -> Option<&GatewaySession> {
        self.sessions.get(session_id)
    }

    /// Look up an active session.
    pub fn active(&self, session_id: &Uuid) -> Option<&GatewaySession> {
        self.sessions
            .get(session_id)
            .filter(|s| s.state == SessionState::Active)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &GatewaySession> {
        self.sessions
            .values()
            .filter(|s| s.state == SessionState::Active)
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    pub fn total_count(&self) -> usize {
        self.sessions.len()
    }

    /// Summaries of active sessions, oldest first.
    pub fn summaries(&self, connections: &ConnectionManager) -> Vec<SessionSummary> {
        let mut out: Vec<SessionSummary> = self
            .iter_active()
            .map(|s| SessionSummary {
                session_id: s.session_id,
                connection_id: s.connection_id,
                state: s.state,
                created_at: s.created_at,
                last_activity: connections.get(&s.connection_id).map(|c| c.last_activity),
                pending_question: s.dispatcher.registry().current().map(|q| q.text.clone()),
            })
            .collect();
        out.sort_by_key(|s| s.created_at);
        out
    }

    /// Remove ended sessions, dropping their outbound channels.
    pub fn cleanup_ended(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.state != SessionState::Ended);
        before - self.sessions.len()
    }
}
