//! WebSocket streaming of land detection results.
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use land_core::LandDetectionResult;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.results().subscribe();

    // New clients get the current result before the live stream.
    if let Some(latest) = state.results().latest() {
        if send_result(&mut socket, &latest).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(result) => {
                        if send_result(&mut socket, &result).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("WebSocket client lagged, skipped {} results", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send_result(socket: &mut WebSocket, result: &LandDetectionResult) -> Result<(), axum::Error> {
    let payload = match serde_json::to_string(result) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!("Failed to encode land detection result: {}", err);
            return Ok(());
        }
    };
    socket.send(Message::Text(payload)).await
}
