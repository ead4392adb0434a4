//! WebSocket support for live job updates.
//!
//! Every scheduler event is forwarded to connected clients as a JSON text
//! message tagged by `type`. A heartbeat keeps idle connections open.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use ytdl_core::SchedulerEvent;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Message sent to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WsMessage {
    /// A scheduler event, serialized with its own `type` tag.
    Event(SchedulerEvent),
    Heartbeat(Heartbeat),
}

#[derive(Debug, Clone, Serialize)]
pub struct Heartbeat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: i64,
}

impl WsMessage {
    pub fn heartbeat() -> Self {
        Self::Heartbeat(Heartbeat {
            kind: "heartbeat",
            timestamp: Utc::now().timestamp(),
        })
    }

    /// Label used for the messages-sent metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event(event) => match event {
                SchedulerEvent::JobAdded { .. } => "job_added",
                SchedulerEvent::BatchStarted { .. } => "batch_started",
                SchedulerEvent::BatchPaused => "batch_paused",
                SchedulerEvent::BatchResumed => "batch_resumed",
                SchedulerEvent::BatchStopped { .. } => "batch_stopped",
                SchedulerEvent::DownloadStarted { .. } => "download_started",
                SchedulerEvent::JobProgress { .. } => "job_progress",
                SchedulerEvent::DownloadCompleted { .. } => "download_completed",
                SchedulerEvent::JobCancelled { .. } => "job_cancelled",
            },
            Self::Heartbeat(_) => "heartbeat",
        }
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.scheduler().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // First tick fires immediately
        heartbeat.tick().await;

        loop {
            let msg = tokio::select! {
                result = rx.recv() => match result {
                    Ok(event) => WsMessage::Event(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("WebSocket client lagged, skipped {} messages", n);
                        WS_LAG_EVENTS.inc();
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Scheduler event stream closed");
                        break;
                    }
                },
                _ = heartbeat.tick() => WsMessage::heartbeat(),
            };

            WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize WsMessage: {}", e),
            }
        }
    });

    // Client messages are not part of the protocol; only watch for close
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => debug!("Ignoring client message: {}", text),
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytdl_core::JobId;

    #[test]
    fn test_event_message_keeps_event_tag() {
        let msg = WsMessage::Event(SchedulerEvent::JobCancelled {
            job_id: JobId::from("video_1_1"),
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "job_cancelled");
        assert_eq!(json["job_id"], "video_1_1");
        assert_eq!(msg.kind(), "job_cancelled");
    }

    #[test]
    fn test_heartbeat_message() {
        let json: serde_json::Value = serde_json::to_value(WsMessage::heartbeat()).unwrap();
        assert_eq!(json["type"], "heartbeat");
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }
}
