//! Send-only WebSocket push of particle snapshots.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::scheduler::{BroadcastScheduler, SubscriberId};

pub async fn ws_particles(
    ws: WebSocketUpgrade,
    State(scheduler): State<BroadcastScheduler>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, scheduler))
}

/// Registers the connection for the lifetime of the socket. The scheduler
/// only ever pushes into the channel; a per-connection task drains it into
/// the socket so slow clients never hold the scheduler lock.
async fn handle_socket(socket: WebSocket, scheduler: BroadcastScheduler) {
    let id = SubscriberId::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<str>>();
    let (mut sender, mut receiver) = socket.split();

    scheduler.subscribe(id, Arc::new(tx));
    tracing::info!(subscriber_id = %id, "WebSocket connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(err) = sender.send(Message::Text((&*payload).into())).await {
                tracing::warn!(subscriber_id = %id, error = %err, "Failed to send snapshot");
                break;
            }
        }
    });

    // Inbound frames carry no protocol; only a close ends the subscription.
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(subscriber_id = %id, error = %err, "WebSocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    scheduler.unsubscribe(id);
    tracing::info!(subscriber_id = %id, "WebSocket disconnected");
}
