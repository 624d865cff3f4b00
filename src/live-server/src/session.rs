//! A single viewer connection.
//!
//! The session reads requests from the socket and answers through the hub, which owns the
//! viewer's outbound queue. A separate writer task drains that queue into the socket so slow
//! viewers never hold up the reader or the broadcast tick.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::{OwnedSemaphorePermit, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    hub::{Delivery, Outbound, SessionChannel},
    protocol::{ClientRequest, ServerMessage, VesselData, VesselQuery},
    startup::AppState,
};

/// `slot` is the viewer's connection permit, released when the session ends.
pub async fn run_session(socket: WebSocket, state: Arc<AppState>, slot: OwnedSemaphorePermit) {
    let SessionChannel {
        id,
        receiver,
        cancellation,
    } = state.hub.register();
    info!(session = %id, clients = state.hub.len(), "viewer connected");

    let (ws_tx, mut ws_rx) = socket.split();
    let writer = tokio::spawn(write_loop(id, ws_tx, receiver));

    let now = Utc::now();
    let welcome = ServerMessage::ConnectionEstablished {
        client_id: id,
        timestamp: now,
        message: "Connected to real-time vessel stream".to_string(),
        fleet_summary: state.fleet_summary(),
    };

    if state.hub.reply(id, &welcome).await != Delivery::Closed {
        loop {
            let message = tokio::select! {
                _ = cancellation.cancelled() => break,
                message = ws_rx.next() => message,
            };

            let response = match message {
                Some(Ok(Message::Text(text))) => handle_request(&state, id, &text, Utc::now()),
                Some(Ok(Message::Binary(_))) => {
                    ServerMessage::error("binary frames are not supported")
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(session = %id, "viewer socket error: {e}");
                    break;
                }
            };

            if state.hub.reply(id, &response).await == Delivery::Closed {
                break;
            }
        }
    }

    // Dropping the hub's sender lets the writer flush what is queued and stop.
    state.hub.unregister(id);
    if tokio::time::timeout(state.hub.close_timeout(), writer)
        .await
        .is_err()
    {
        warn!(session = %id, "viewer writer did not finish in time");
    }

    drop(slot);
    info!(session = %id, clients = state.hub.len(), "viewer disconnected");
}

async fn write_loop(
    id: Uuid,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut receiver: mpsc::Receiver<Outbound>,
) {
    while let Some(outbound) = receiver.recv().await {
        match outbound {
            Outbound::Text(text) => {
                if let Err(e) = ws_tx.send(Message::Text(text.to_string())).await {
                    debug!(session = %id, "failed to write to viewer: {e}");
                    break;
                }
            }
            Outbound::Close => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: "server shutting down".into(),
                };
                if let Err(e) = ws_tx.send(Message::Close(Some(frame))).await {
                    debug!(session = %id, "failed to send close frame: {e}");
                }
                break;
            }
        }
    }
}

/// Answers a single request. Malformed requests produce an `error` response and never end the
/// session.
pub fn handle_request(
    state: &AppState,
    session: Uuid,
    text: &str,
    now: DateTime<Utc>,
) -> ServerMessage {
    let request: ClientRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            debug!(session = %session, "invalid viewer request: {e}");
            return ServerMessage::error(format!("invalid request: {e}"));
        }
    };

    match request {
        ClientRequest::Subscribe { topic } => {
            state.hub.subscribe(session, topic);
            info!(session = %session, %topic, "viewer subscribed");
            ServerMessage::SubscriptionConfirmed {
                topic,
                timestamp: now,
            }
        }
        ClientRequest::GetVessel {
            identity,
            imo_number,
        } => {
            let Some(query) = ClientRequest::vessel_query(identity, imo_number) else {
                return ServerMessage::error("get_vessel requires an identity");
            };
            let record = match query {
                VesselQuery::Mmsi(mmsi) => state.vessels.get(mmsi),
                VesselQuery::Imo(imo) => state.vessels.find_by_imo(imo),
            };
            ServerMessage::VesselData {
                identity: query,
                vessel: record.as_ref().map(VesselData::from),
                timestamp: now,
            }
        }
        ClientRequest::GetFleetSummary => ServerMessage::FleetSummary {
            summary: state.fleet_summary(),
            timestamp: now,
        },
        ClientRequest::GetLiveStatus => ServerMessage::LiveStatus {
            status: state.stats.snapshot(now),
            timestamp: now,
        },
    }
}
