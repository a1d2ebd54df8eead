//! WebSocket gateway server built on axum.

use super::connection::ConnectionManager;
use super::events::{OutboundMessage, QuestionPayload};
use super::session::{GatewaySession, SessionManager};
use super::GatewayConfig;
use crate::dispatcher::SessionDispatcher;
use crate::error::ProtocolError;
use crate::terminal::TerminalInjector;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Thread-safe shared gateway reference for axum handlers.
pub type SharedGateway = Arc<Mutex<GatewayServer>>;

/// Everything a socket task needs to serve one session.
pub struct SessionHandle {
    pub connection_id: Uuid,
    pub session_id: Uuid,
    pub dispatcher: Arc<SessionDispatcher>,
    pub outbound: mpsc::UnboundedSender<OutboundMessage>,
    pub receiver: mpsc::UnboundedReceiver<OutboundMessage>,
}

/// The WebSocket gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    connections: ConnectionManager,
    sessions: SessionManager,
    injector: Arc<dyn TerminalInjector>,
    started_at: chrono::DateTime<Utc>,
}

impl std::fmt::Debug for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServer")
            .field("config", &self.config)
            .field("injector", &self.injector.name())
            .field("connections", &self.connections.active_count())
            .field("sessions", &self.sessions.total_count())
            .finish()
    }
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, injector: Arc<dyn TerminalInjector>) -> Self {
        let connections = ConnectionManager::new(config.max_connections);
        Self {
            config,
            connections,
            sessions: SessionManager::new(),
            injector,
            started_at: Utc::now(),
        }
    }

    /// Wrap in the shared handle the router expects.
    pub fn into_shared(self) -> SharedGateway {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn active_connections(&self) -> usize {
        self.connections.active_count()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.active_count()
    }

    /// Uptime in seconds since the server was created.
    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }

    /// Register a connection and its session. Returns `None` at capacity.
    pub fn open_session(&mut self) -> Option<SessionHandle> {
        let connection_id = self.connections.add_connection()?;
        let dispatcher = Arc::new(SessionDispatcher::new(Arc::clone(&self.injector)));
        let (session_id, receiver) = self
            .sessions
            .create_session(connection_id, Arc::clone(&dispatcher));
        let outbound = self.sessions.get(&session_id).map(GatewaySession::sender)?;
        info!(%connection_id, %session_id, "Client connected");
        Some(SessionHandle {
            connection_id,
            session_id,
            dispatcher,
            outbound,
            receiver,
        })
    }

    /// Tear down a connection and its session.
    pub fn close_session(&mut self, connection_id: &Uuid, session_id: &Uuid) {
        self.sessions.end_session(session_id);
        self.sessions.cleanup_ended();
        self.connections.remove_connection(connection_id);
        info!(%connection_id, %session_id, "Client disconnected");
    }

    /// Install a question on one session and push it to the client.
    pub fn present_question(
        &self,
        session_id: &Uuid,
        question: &QuestionPayload,
    ) -> Result<(), ProtocolError> {
        let session = self
            .sessions
            .active(session_id)
            .ok_or_else(|| ProtocolError::UnknownSession {
                session_id: session_id.to_string(),
            })?;
        let msg = session
            .dispatcher()
            .present_question(question.text.clone(), question.options.clone())?;
        if !session.send(msg) {
            debug!(%session_id, "Session writer already closed");
        }
        Ok(())
    }

    /// Install a question on every active session. Returns how many sessions
    /// received it.
    pub fn broadcast_question(&self, question: &QuestionPayload) -> Result<usize, ProtocolError> {
        if question.options.is_empty() {
            return Err(ProtocolError::EmptyOptions);
        }
        let mut delivered = 0;
        for session in self.sessions.iter_active() {
            let msg = session
                .dispatcher()
                .present_question(question.text.clone(), question.options.clone())?;
            if session.send(msg) {
                delivered += 1;
            }
        }
        info!(delivered, "Broadcast question");
        Ok(delivered)
    }
}

/// Build the axum router.
///
/// Routes: `/ws` (WebSocket), `/` and `/health` (health), `/status`,
/// `/sessions`, `POST /question`, `POST /sessions/{id}/question`.
pub fn router(shared: SharedGateway) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/ws", get(ws_handler))
        .route("/sessions", get(sessions_handler))
        .route("/question", post(broadcast_question_handler))
        .route("/sessions/{id}/question", post(session_question_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn ws_handler(ws: WebSocketUpgrade, State(gw): State<SharedGateway>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, gw))
}

async fn health_handler(State(gw): State<SharedGateway>) -> impl IntoResponse {
    let gw = gw.lock().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "Aura Bridge WebSocket Server",
        "connections": gw.active_connections(),
        "sessions": gw.active_sessions(),
        "uptime_secs": gw.uptime_secs(),
    }))
}

async fn status_handler(State(gw): State<SharedGateway>) -> impl IntoResponse {
    let gw = gw.lock().await;
    Json(serde_json::json!({
        "status": "running",
        "connected_clients": gw.active_connections(),
        "max_connections": gw.connections().max_connections(),
        "active_sessions": gw.active_sessions(),
    }))
}

async fn sessions_handler(State(gw): State<SharedGateway>) -> impl IntoResponse {
    let gw = gw.lock().await;
    Json(gw.sessions().summaries(gw.connections()))
}

async fn broadcast_question_handler(
    State(gw): State<SharedGateway>,
    Json(question): Json<QuestionPayload>,
) -> Response {
    let gw = gw.lock().await;
    match gw.broadcast_question(&question) {
        Ok(delivered) => Json(serde_json::json!({ "delivered": delivered })).into_response(),
        Err(e) => protocol_error_response(e),
    }
}

async fn session_question_handler(
    State(gw): State<SharedGateway>,
    Path(session_id): Path<Uuid>,
    Json(question): Json<QuestionPayload>,
) -> Response {
    let gw = gw.lock().await;
    match gw.present_question(&session_id, &question) {
        Ok(()) => Json(serde_json::json!({ "delivered": 1 })).into_response(),
        Err(e) => protocol_error_response(e),
    }
}

fn protocol_error_response(err: ProtocolError) -> Response {
    let status = match err {
        ProtocolError::UnknownSession { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// Serve one WebSocket connection until the client leaves.
async fn handle_socket(mut socket: WebSocket, gw: SharedGateway) {
    let handle = {
        let mut gw = gw.lock().await;
        gw.open_session()
    };
    let Some(handle) = handle else {
        warn!("Rejecting connection: server at capacity");
        let err = OutboundMessage::error("Server at maximum connections");
        if let Ok(json) = serde_json::to_string(&err) {
            let _ = socket.send(WsMessage::Text(json.into())).await;
        }
        let _ = socket.close().await;
        return;
    };

    let SessionHandle {
        connection_id,
        session_id,
        dispatcher,
        outbound,
        mut receiver,
    } = handle;
    let (mut sink, mut stream) = socket.split();

    // Replies and pushed questions share one ordered channel.
    let writer = tokio::spawn(async move {
        while let Some(msg) = receiver.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode outbound message");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(Ok(ws_msg)) = stream.next().await {
        let reply = match ws_msg {
            WsMessage::Text(t) => {
                gw.lock().await.connections_mut().touch(&connection_id);
                dispatcher.handle_text(t.as_str()).await
            }
            WsMessage::Binary(bytes) => {
                gw.lock().await.connections_mut().touch(&connection_id);
                match std::str::from_utf8(&bytes) {
                    Ok(text) => dispatcher.handle_text(text).await,
                    Err(_) => {
                        warn!(%session_id, len = bytes.len(), "Binary frame is not UTF-8");
                        OutboundMessage::error(ProtocolError::MalformedEnvelope {
                            message: "binary frame is not valid UTF-8".into(),
                        })
                    }
                }
            }
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
        };
        debug!(%session_id, kind = reply.kind(), "Replying");
        if outbound.send(reply).is_err() {
            break;
        }
    }

    gw.lock().await.close_session(&connection_id, &session_id);
    drop(outbound);
    let _ = writer.await;
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn run<F>(gw: SharedGateway, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = gw.lock().await.config().bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Bridge gateway listening (WebSocket at /ws)");
    axum::serve(listener, router(gw))
        .with_graceful_shutdown(shutdown)
        .await
}
