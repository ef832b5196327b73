//! TerminalHub: realtime fanout to store terminals
//!
//! ```text
//! Order / staff-call services
//!       │ TerminalEvent
//!       ▼
//! TerminalHub
//!   └── stores: store_id → (connection_id → mpsc::Sender<TerminalEvent>)
//!         │
//!         ▼
//!   Terminal WS session (one per socket, drains its receiver)
//! ```
//!
//! Delivery is fire-and-forget. A terminal that is not connected when an
//! event is broadcast never sees it and pulls outstanding orders on reconnect.

use dashmap::DashMap;
use shared::TerminalEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Identifies one terminal connection within the hub
pub type ConnectionId = u64;

/// Per-store connection registry
#[derive(Clone, Default)]
pub struct TerminalHub {
    /// store_id → (connection_id → sender)
    stores: Arc<DashMap<i64, DashMap<ConnectionId, mpsc::Sender<TerminalEvent>>>>,
    next_id: Arc<AtomicU64>,
}

impl TerminalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a terminal for a store
    pub fn connect(&self, store_id: i64, sender: mpsc::Sender<TerminalEvent>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.stores.entry(store_id).or_default().insert(id, sender);
        tracing::info!(store_id, connection_id = id, "Terminal connected");
        id
    }

    /// Remove a terminal. Unknown ids are ignored.
    pub fn disconnect(&self, store_id: i64, id: ConnectionId) {
        let removed = self
            .stores
            .get(&store_id)
            .and_then(|conns| conns.remove(&id))
            .is_some();
        self.stores.remove_if(&store_id, |_, conns| conns.is_empty());
        if removed {
            tracing::info!(store_id, connection_id = id, "Terminal disconnected");
        }
    }

    /// Number of terminals currently connected for a store
    pub fn connection_count(&self, store_id: i64) -> usize {
        self.stores.get(&store_id).map_or(0, |conns| conns.len())
    }

    /// Push `event` to every terminal of the store.
    ///
    /// Iterates a snapshot of the handles so connects/disconnects during the
    /// broadcast are safe. A handle that is closed or full is removed and the
    /// others still receive the event. Returns how many terminals got it.
    pub fn broadcast(&self, store_id: i64, event: &TerminalEvent) -> usize {
        let snapshot: Vec<(ConnectionId, mpsc::Sender<TerminalEvent>)> =
            match self.stores.get(&store_id) {
                Some(conns) => conns
                    .iter()
                    .map(|e| (*e.key(), e.value().clone()))
                    .collect(),
                None => return 0,
            };

        let mut delivered = 0;
        for (id, sender) in snapshot {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        store_id,
                        connection_id = id,
                        event = event.kind(),
                        error = %e,
                        "Dropping terminal after failed delivery"
                    );
                    self.disconnect(store_id, id);
                }
            }
        }
        delivered
    }
}
