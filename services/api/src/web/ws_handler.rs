//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket
//! connection. Each connection hosts one dialogue engine: inbound
//! user_message frames become `submit` calls, and the engine's event stream
//! is relayed back to the client as transcript and composing updates.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use finance_assistant_core::{DialogueEngine, EngineEvent};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is wrapped in an Arc<Mutex<>> so the event-forwarding task
    // and the main loop can share it.
    let (sender, mut receiver) = socket.split();
    let ws_sender = Arc::new(Mutex::new(sender));

    // --- 1. Session Setup ---
    // One engine (and one conversation) per connection. The greeting
    // arrives through the event stream like every later transcript entry.
    let (engine, mut engine_events) = DialogueEngine::new(
        app_state.taxonomy.clone(),
        app_state.random.clone(),
        app_state.config.reply_delay,
    );
    let conversation_id = engine.conversation_id().await;

    let init_msg = ServerMessage::SessionInitialized { conversation_id };
    let init_json = serde_json::to_string(&init_msg).unwrap();
    if ws_sender
        .lock()
        .await
        .send(Message::Text(init_json.into()))
        .await
        .is_err()
    {
        error!("Failed to send session initialized message.");
        return;
    }

    // --- 2. Event Forwarding Task ---
    let forward_task = {
        let ws_sender = ws_sender.clone();
        tokio::spawn(async move {
            while let Some(event) = engine_events.recv().await {
                if forward_event(event, &ws_sender).await.is_err() {
                    warn!("Failed to forward engine event. Client may have disconnected.");
                    break;
                }
            }
        })
    };

    // --- 3. Main Message Loop ---
    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_message(text.to_string(), &engine, &ws_sender).await;
                }
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- 4. Cleanup ---
    // Cancel any outstanding reply timers so nothing appends to a disposed
    // conversation, then stop relaying events.
    engine.close();
    forward_task.abort();
    info!("WebSocket connection closed.");
}

/// Translates one engine event into a `ServerMessage` frame.
async fn forward_event(
    event: EngineEvent,
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
) -> Result<(), axum::Error> {
    let msg = match event {
        EngineEvent::Appended(utterance) => ServerMessage::Message { utterance },
        EngineEvent::Composing(active) => ServerMessage::Composing { active },
    };
    let json = serde_json::to_string(&msg).unwrap();
    ws_sender.lock().await.send(Message::Text(json.into())).await
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: String,
    engine: &DialogueEngine,
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
) {
    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(ClientMessage::UserMessage { text }) => {
            // Empty-after-trim text is the engine's documented no-op; no
            // validation happens here.
            engine.submit(&text).await;
        }
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let err_msg = ServerMessage::Error {
                message: "Unrecognized message format.".to_string(),
            };
            let err_json = serde_json::to_string(&err_msg).unwrap();
            let _ = ws_sender
                .lock()
                .await
                .send(Message::Text(err_json.into()))
                .await;
        }
    }
}
