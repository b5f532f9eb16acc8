//! WebSocket upgrade handler for the signaling relay

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::relay::room::RelayError;
use crate::util::rate_limit::PeerRateLimiter;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Room to pair with; both peers of a duel use the same id
    pub room: String,
}

/// WebSocket upgrade handler. The room slot is claimed before upgrading so
/// a third participant is refused outright instead of corrupting an
/// in-flight negotiation.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let peer_id = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();

    match state.rooms.join(&query.room, peer_id, tx) {
        Ok(()) => {
            info!(room = %query.room, peer = %peer_id, "Peer joined signaling room");
            ws.on_upgrade(move |socket| handle_socket(socket, query.room, peer_id, rx, state))
        }
        Err(RelayError::RoomFull) => {
            warn!(room = %query.room, "Rejecting third participant");
            Response::builder()
                .status(403)
                .body("Room full".into())
                .unwrap()
        }
    }
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    room_id: String,
    peer_id: Uuid,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    state: AppState,
) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Writer task: forwarded payloads -> WebSocket
    let writer_peer_id = peer_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(payload)).await {
                debug!(peer = %writer_peer_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let rate_limiter = PeerRateLimiter::new();
    let idle_timeout = Duration::from_secs(state.config.idle_timeout_secs);

    // Reader loop: WebSocket -> the other room occupant. The relay never
    // inspects payloads; they stay opaque text.
    loop {
        let next = match tokio::time::timeout(idle_timeout, ws_stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                info!(room = %room_id, peer = %peer_id, "Idle connection, closing");
                break;
            }
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                if !rate_limiter.check_signal() {
                    warn!(room = %room_id, peer = %peer_id, "Rate limited signaling message");
                    continue;
                }

                let delivered = state.rooms.forward(&room_id, peer_id, &text);
                if delivered == 0 {
                    debug!(room = %room_id, peer = %peer_id, "No peer yet, payload dropped");
                }
            }
            Some(Ok(Message::Binary(_))) => {
                warn!(peer = %peer_id, "Received binary message, ignoring");
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                debug!(peer = %peer_id, "Received ping/pong");
            }
            Some(Ok(Message::Close(_))) => {
                info!(room = %room_id, peer = %peer_id, "Client initiated close");
                break;
            }
            Some(Err(e)) => {
                error!(room = %room_id, peer = %peer_id, error = %e, "WebSocket error");
                break;
            }
            None => break,
        }
    }

    state.rooms.leave(&room_id, peer_id);
    writer_handle.abort();

    info!(room = %room_id, peer = %peer_id, "Peer left signaling room");
}
