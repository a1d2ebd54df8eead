//! # WebSocket Gateway
//!
//! HTTP + WebSocket server that remote clients connect to. Each WebSocket
//! connection gets its own session with its own pending question; questions
//! from the assistant are pushed in over HTTP and forwarded to the sessions.

mod connection;
mod events;
mod server;
mod session;

pub use connection::{ConnectionInfo, ConnectionManager};
pub use events::{InboundMessage, OutboundMessage, QuestionPayload};
pub use server::{
    router as gateway_router, run as run_gateway, GatewayServer, SessionHandle, SharedGateway,
};
pub use session::{GatewaySession, SessionManager, SessionState, SessionSummary};

use serde::{Deserialize, Serialize};

/// Configuration for the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            max_connections: 16,
        }
    }
}

impl GatewayConfig {
    /// `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
