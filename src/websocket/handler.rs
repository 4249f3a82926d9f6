use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    routes::matches::load_match_details,
    websocket::messages::{ClientMessage, ServerMessage},
    AppState,
};

/// Live scoreboard for one match. Unknown matches are rejected before the
/// upgrade so the client sees a plain 404.
pub async fn handle_match_socket(
    Path(match_id): Path<Uuid>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    state
        .store
        .get_match(match_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Match", match_id))?;
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, match_id))
        .into_response())
}

/// Subscribe to a match, then load its snapshot. A mutation published in
/// between reaches the receiver as well, so nothing is missed.
async fn open_feed(
    state: &AppState,
    match_id: Uuid,
) -> (broadcast::Receiver<ServerMessage>, ServerMessage) {
    let updates = state.hub.subscribe(match_id);
    let initial = current_snapshot(state, match_id).await;
    (updates, initial)
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, match_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (mut updates, initial) = open_feed(&state, match_id).await;
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(16);

    tracing::info!(
        "Scoreboard viewer connected to match {} ({} watching)",
        match_id,
        state.hub.subscriber_count(match_id)
    );

    // Forward broadcasts and direct replies to the client
    let send_state = state.clone();
    let mut send_task = tokio::spawn(async move {
        if send_message(&mut sender, &initial).await.is_err() {
            return;
        }

        loop {
            let message = tokio::select! {
                update = updates.recv() => match update {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        // Snapshots are complete, so the latest one replaces the missed ones
                        tracing::warn!(
                            "Viewer of match {} lagged by {} updates, resending snapshot",
                            match_id,
                            skipped
                        );
                        current_snapshot(&send_state, match_id).await
                    }
                    Err(RecvError::Closed) => break,
                },
                direct = rx.recv() => match direct {
                    Some(message) => message,
                    None => break,
                },
            };

            if send_message(&mut sender, &message).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages from the client
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Refresh) => current_snapshot(&recv_state, match_id).await,
                        Err(e) => {
                            tracing::debug!("Failed to parse message: {}", e);
                            ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            }
                        }
                    };
                    if tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish, then make sure the other has dropped
    // its half before releasing the channel
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => {
            send_task.abort();
            let _ = send_task.await;
        }
    }

    state.hub.release(match_id);
    tracing::info!("Scoreboard viewer disconnected from match {}", match_id);
}

async fn current_snapshot(state: &AppState, match_id: Uuid) -> ServerMessage {
    match load_match_details(state, match_id).await {
        Ok(details) => ServerMessage::snapshot(details),
        Err(e) => {
            tracing::error!("Failed to load snapshot for match {}: {}", match_id, e);
            ServerMessage::Error {
                message: e.client_message(),
            }
        }
    }
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            return Ok(());
        }
    };

    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
