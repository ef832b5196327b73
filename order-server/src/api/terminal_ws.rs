//! Store terminal WebSocket endpoint
//!
//! GET /api/stores/{store_id}/ws
//!
//! Protocol:
//! - Server → Terminal: `TerminalEvent` JSON text frames (NEW_ORDER, STAFF_CALL)
//! - Terminal → Server: ignored (pongs and stray text are read and dropped)

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use shared::TerminalEvent;
use shared::error::{AppError, ErrorCode};
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub async fn handle_terminal_ws(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ServiceError> {
    db::catalog::get_store(&state.pool, store_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound).with_detail("store_id", store_id))?;

    Ok(ws.on_upgrade(move |socket| terminal_ws_session(socket, state, store_id)))
}

async fn terminal_ws_session(socket: WebSocket, state: AppState, store_id: i64) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel::<TerminalEvent>(state.terminal_channel_capacity);
    let connection_id = state.hub.connect(store_id, tx);

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = rx.recv() => {
                match event {
                    Some(event) => {
                        if send_message(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    // Hub dropped this terminal after a failed delivery
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.hub.disconnect(store_id, connection_id);
}

async fn send_message<S>(sink: &mut S, event: &TerminalEvent) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize terminal event");
    })?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
