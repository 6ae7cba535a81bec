//! Per-connection WebSocket lifecycle.
//!
//! Each accepted connection gets a bounded outbound queue registered with
//! the hub. The task here pumps that queue into the socket and drains
//! inbound frames; the hub side only ever sees the queue's sender. The
//! lifecycle is `Connecting -> Open -> Closed` with no way back out of
//! `Closed`: a reconnecting subscriber gets a fresh connection id.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use sigwatch_hub::ConnectionId;

use crate::server::{AppState, ConnectionGuard};

pub(crate) async fn handle_socket(mut socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let id = ConnectionId::next();

    // Push the current document before the first detected change so a new
    // subscriber is never staring at nothing.
    match state.hub.current_document() {
        Ok(doc) => {
            if socket.send(Message::Text(doc.into())).await.is_err() {
                debug!(connection = %id, "Client disconnected before initial document");
                return;
            }
        }
        Err(e) => {
            debug!(connection = %id, error = %e, "Failed to encode initial document");
            return;
        }
    }

    let (tx, mut rx) = mpsc::channel(state.config.send_queue_depth);
    state.hub.registry().add(id, tx);

    let (mut sender, mut receiver) = socket.split();

    // Inbound frames carry no hub action in this protocol; drain them for
    // close/error detection and log text at debug.
    let mut inbound = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    debug!(message = %text, "Client message (ignored)");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            payload = rx.recv() => {
                match payload {
                    Some(payload) => {
                        if sender.send(Message::Text(payload.as_ref().into())).await.is_err() {
                            debug!(connection = %id, "Send failed, closing connection");
                            break;
                        }
                    }
                    // The dispatcher pruned us (dead or too slow); the
                    // registry entry is already gone.
                    None => {
                        debug!(connection = %id, "Outbound queue closed by dispatcher");
                        break;
                    }
                }
            }
            _ = &mut inbound => {
                break;
            }
        }
    }

    inbound.abort();

    // Idempotent: the dispatcher may have removed us already.
    state.hub.registry().remove(id);
    debug!(connection = %id, "WebSocket connection closed");
}
