//! WebSocket connection bookkeeping.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata about a connected WebSocket client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: Uuid,
    pub last_activity: DateTime<Utc>,
}

/// Tracks open connections against a capacity limit.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: HashMap<Uuid, ConnectionInfo>,
    max_connections: usize,
}

impl ConnectionManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: HashMap::new(),
            max_connections,
        }
    }

    /// Register a new connection. Returns `None` if the limit is reached.
    pub fn add_connection(&mut self) -> Option<Uuid> {
        if self.connections.len() >= self.max_connections {
            return None;
        }

        let id = Uuid::new_v4();
        self.connections.insert(
            id,
            ConnectionInfo {
                connection_id: id,
                last_activity: Utc::now(),
            },
        );
        Some(id)
    }

    pub fn remove_connection(&mut self, id: &Uuid) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Record activity on a connection.
    pub fn touch(&mut self, id: &Uuid) {
        if let Some(conn) = self.connections.get_mut(id) {
            conn.last_activity = Utc::now();
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&ConnectionInfo> {
        self.connections.get(id)
    }

    pub fn active_count(&self) -> usize {
        self.connections.len()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}
