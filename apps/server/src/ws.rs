//! WebSocket transport for the fan-out hub.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use serde::Serialize;
use stockpulse_core::fanout::{Frame, Inbound, SinkError, SubscriberSink};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::main_lib::AppState;

#[derive(Serialize)]
struct AdmissionBody {
    error: String,
    limit: usize,
    current: usize,
}

/// Write half of one socket. The mutex serializes broadcast frames and pings.
struct WsSink {
    tx: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsSink {
    fn new(tx: SplitSink<WebSocket, Message>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

fn transport(e: axum::Error) -> SinkError {
    SinkError::Transport(e.to_string())
}

#[async_trait]
impl SubscriberSink for WsSink {
    async fn send_text(&self, frame: Frame) -> Result<(), SinkError> {
        let mut tx = self.tx.lock().await;
        tx.send(Message::Text(frame.as_ref().into()))
            .await
            .map_err(transport)
    }

    async fn send_ping(&self) -> Result<(), SinkError> {
        let mut tx = self.tx.lock().await;
        tx.send(Message::Ping(Bytes::new())).await.map_err(transport)
    }

    async fn close(&self) {
        let mut tx = self.tx.lock().await;
        let _ = tx.close().await;
    }
}

fn to_inbound(message: Result<Message, axum::Error>) -> Result<Inbound, SinkError> {
    match message {
        Ok(Message::Text(text)) => Ok(Inbound::Text(text.as_str().to_owned())),
        Ok(Message::Binary(_)) => Ok(Inbound::Binary),
        Ok(Message::Ping(_)) => Ok(Inbound::Ping),
        Ok(Message::Pong(_)) => Ok(Inbound::Pong),
        Ok(Message::Close(_)) => Ok(Inbound::Close),
        Err(e) => Err(transport(e)),
    }
}

/// `GET /ws`. The admission cap is checked before the upgrade so a rejected
/// client costs no handshake.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ticket = match state.hub.try_admit() {
        Ok(ticket) => ticket,
        Err(rejected) => {
            let body = AdmissionBody {
                error: "Maximum connections reached".to_string(),
                limit: rejected.limit,
                current: rejected.current,
            };
            return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        }
    };
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    upgrade.on_upgrade(move |socket| async move {
        let (tx, rx) = socket.split();
        let sink: Arc<dyn SubscriberSink> = Arc::new(WsSink::new(tx));
        let id = match state.hub.register(ticket, sink).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Subscriber registration failed: {}", e);
                return;
            }
        };

        let inbound = rx.map(to_inbound);
        let end = state
            .hub
            .drive_session(id, inbound, state.shutdown.child_token())
            .await;
        info!("Subscriber {} session ended: {:?}", id, end);
    })
}
