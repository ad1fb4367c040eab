//! Per-event chat rooms over WebSocket.
//!
//! Frames are JSON objects `{ "event": <name>, "data": <payload> }`:
//!
//! | direction | event        | data                                   |
//! |-----------|--------------|----------------------------------------|
//! | in        | `joinEvent`  | event id                               |
//! | in        | `leaveEvent` | event id                               |
//! | in        | `message`    | `{ eventId, message: {sender, text} }` |
//! | out       | `joined`     | event id                               |
//! | out       | `message`    | the chat message                       |
//! | out       | `error`      | `{ message }`                          |
//!
//! Message fields beyond `sender`, `text` and `timestamp` are kept as sent.
//! Every message is appended to the event's log, then sent to everyone in
//! the room, sender included. A failed append is logged and the message is
//! still relayed.

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use crate::models::ChatMessage;
use crate::repository::EventRepository;
use crate::service::EventService;

const ROOM_CAPACITY: usize = 64;

/// Broadcast channels keyed by event id, created on first join and removed
/// when the last member leaves.
#[derive(Clone)]
pub struct ChatRooms {
    rooms: Arc<DashMap<Uuid, broadcast::Sender<String>>>,
    capacity: usize,
}

impl Default for ChatRooms {
    fn default() -> Self {
        Self::new(ROOM_CAPACITY)
    }
}

impl ChatRooms {
    pub fn new(capacity_per_room: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            capacity: capacity_per_room.max(1),
        }
    }

    pub fn subscribe(&self, event_id: Uuid) -> broadcast::Receiver<String> {
        self.rooms
            .entry(event_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send a frame to the room's members; returns how many received it.
    pub fn publish(&self, event_id: Uuid, frame: String) -> usize {
        match self.rooms.get(&event_id) {
            Some(room) => room.send(frame).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop the room if nobody is subscribed any more.
    pub fn release(&self, event_id: Uuid) {
        self.rooms
            .remove_if(&event_id, |_, room| room.receiver_count() == 0);
    }

    pub fn members(&self, event_id: Uuid) -> usize {
        self.rooms
            .get(&event_id)
            .map(|room| room.receiver_count())
            .unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ClientFrame {
    JoinEvent(String),
    LeaveEvent(String),
    Message(IncomingMessage),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingMessage {
    event_id: String,
    message: IncomingChat,
}

#[derive(Debug, Deserialize)]
struct IncomingChat {
    sender: String,
    text: String,
    timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

impl IncomingChat {
    fn stamped(self) -> ChatMessage {
        ChatMessage {
            sender: self.sender,
            text: self.text,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            extra: self.extra,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ServerFrame<'a> {
    Joined(Uuid),
    Message(&'a ChatMessage),
    Error { message: String },
}

impl ServerFrame<'_> {
    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn error(message: impl Into<String>) -> String {
        ServerFrame::Error {
            message: message.into(),
        }
        .encode()
    }
}

struct ChatState<R: EventRepository> {
    service: EventService<R>,
    rooms: ChatRooms,
}

/// `GET /ws`
pub fn router<R: EventRepository + 'static>(service: EventService<R>, rooms: ChatRooms) -> Router {
    Router::new()
        .route("/ws", get(upgrade::<R>))
        .with_state(Arc::new(ChatState { service, rooms }))
}

async fn upgrade<R: EventRepository + 'static>(
    State(state): State<Arc<ChatState<R>>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| relay(socket, state))
}

async fn relay<R: EventRepository + 'static>(socket: WebSocket, state: Arc<ChatState<R>>) {
    let connection = Uuid::now_v7();
    tracing::info!(%connection, "chat client connected");

    let (mut sink, mut stream) = socket.split();
    let (outbound, mut pending) = mpsc::channel::<String>(ROOM_CAPACITY);

    let writer = tokio::spawn(async move {
        while let Some(frame) = pending.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Dropping a stop handle ends that room's forwarder.
    let mut joined: HashMap<Uuid, oneshot::Sender<()>> = HashMap::new();

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame = match serde_json::from_str::<ClientFrame>(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%connection, error = %e, "malformed chat frame");
                let _ = outbound.send(ServerFrame::error("Malformed frame")).await;
                continue;
            }
        };

        match frame {
            ClientFrame::JoinEvent(raw) => {
                let Ok(event_id) = Uuid::parse_str(raw.trim()) else {
                    let _ = outbound.send(ServerFrame::error("Invalid event ID")).await;
                    continue;
                };
                if !joined.contains_key(&event_id) {
                    let stop = forward(&state.rooms, event_id, outbound.clone());
                    joined.insert(event_id, stop);
                    tracing::info!(%connection, %event_id, "joined event chat");
                }
                let _ = outbound.send(ServerFrame::Joined(event_id).encode()).await;
            }
            ClientFrame::LeaveEvent(raw) => {
                if let Ok(event_id) = Uuid::parse_str(raw.trim()) {
                    joined.remove(&event_id);
                }
            }
            ClientFrame::Message(incoming) => {
                let Ok(event_id) = Uuid::parse_str(incoming.event_id.trim()) else {
                    let _ = outbound.send(ServerFrame::error("Invalid event ID")).await;
                    continue;
                };
                let chat = incoming.message.stamped();

                if let Err(e) = state.service.append_message(event_id, chat.clone()).await {
                    tracing::error!(%event_id, error = %e, "failed to persist chat message");
                }
                state
                    .rooms
                    .publish(event_id, ServerFrame::Message(&chat).encode());
            }
        }
    }

    drop(joined);
    writer.abort();
    tracing::info!(%connection, "chat client disconnected");
}

/// Pipe one room into this connection's outbound queue until `stop` fires or is dropped.
fn forward(rooms: &ChatRooms, event_id: Uuid, outbound: mpsc::Sender<String>) -> oneshot::Sender<()> {
    let (stop, mut stopped) = oneshot::channel();
    let mut receiver = rooms.subscribe(event_id);
    let rooms = rooms.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stopped => break,
                frame = receiver.recv() => match frame {
                    Ok(frame) => {
                        if outbound.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%event_id, skipped, "chat client lagging");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        drop(receiver);
        rooms.release(event_id);
    });

    stop
}
