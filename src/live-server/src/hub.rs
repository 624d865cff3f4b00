//! Fan-out of vessel updates to connected viewers.
//!
//! Each viewer owns a bounded queue drained by its own writer task. The hub never awaits a viewer:
//! a full queue drops the message for that viewer only and a closed queue removes the viewer.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use itertools::Itertools;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracker_core::{Mmsi, VesselRecord};
use uuid::Uuid;

use crate::{
    protocol::{ServerMessage, Topic},
    settings::BroadcastSettings,
    summary::FleetSummary,
};

/// What a viewer's writer task receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A serialized [`ServerMessage`], shared between every viewer receiving it.
    Text(Arc<str>),
    /// Send a close frame and stop.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The viewer's queue was full.
    Dropped,
    /// The viewer is gone and has been removed.
    Closed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
    pub disconnected: usize,
}

/// The session side of a registration.
pub struct SessionChannel {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<Outbound>,
    /// Cancelled when the hub forces the session closed.
    pub cancellation: CancellationToken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Subscriptions {
    /// Set by the first explicit `subscribe`, which replaces the implicit `all`.
    explicit: bool,
    all: bool,
    vessels: BTreeSet<Mmsi>,
}

struct SessionHandle {
    sender: mpsc::Sender<Outbound>,
    subscriptions: Subscriptions,
    cancellation: CancellationToken,
}

pub struct BroadcastHub {
    sessions: DashMap<Uuid, SessionHandle>,
    buffer_size: usize,
    close_timeout: Duration,
}

impl Subscriptions {
    fn implicit() -> Self {
        Self {
            explicit: false,
            all: true,
            vessels: BTreeSet::new(),
        }
    }

    fn add(&mut self, topic: Topic) {
        if !self.explicit {
            *self = Self {
                explicit: true,
                ..Default::default()
            };
        }
        match topic {
            Topic::All => self.all = true,
            Topic::Vessel(mmsi) => {
                self.vessels.insert(mmsi);
            }
        }
    }
}

impl BroadcastHub {
    pub fn new(settings: &BroadcastSettings) -> Self {
        Self {
            sessions: DashMap::new(),
            buffer_size: settings.session_buffer_size.max(1),
            close_timeout: settings.close_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn close_timeout(&self) -> Duration {
        self.close_timeout
    }

    /// Adds a viewer subscribed to `all`.
    pub fn register(&self) -> SessionChannel {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let cancellation = CancellationToken::new();

        self.sessions.insert(
            id,
            SessionHandle {
                sender,
                subscriptions: Subscriptions::implicit(),
                cancellation: cancellation.clone(),
            },
        );

        SessionChannel {
            id,
            receiver,
            cancellation,
        }
    }

    pub fn unregister(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Returns false if the viewer is not registered.
    pub fn subscribe(&self, id: Uuid, topic: Topic) -> bool {
        match self.sessions.get_mut(&id) {
            Some(mut session) => {
                session.subscriptions.add(topic);
                true
            }
            None => false,
        }
    }

    /// Queues `message` for a single viewer.
    pub fn send(&self, id: Uuid, message: &ServerMessage) -> Delivery {
        let Some(payload) = serialize(message) else {
            return Delivery::Dropped;
        };

        let delivery = match self.sessions.get(&id) {
            Some(session) => deliver(id, &session, payload),
            None => return Delivery::Closed,
        };

        if delivery == Delivery::Closed {
            self.unregister(id);
        }
        delivery
    }

    /// Queues the response to a viewer request, waiting up to the close timeout for queue space
    /// since every request gets exactly one response.
    pub async fn reply(&self, id: Uuid, message: &ServerMessage) -> Delivery {
        let Some(payload) = serialize(message) else {
            return Delivery::Dropped;
        };
        let Some(sender) = self.sessions.get(&id).map(|s| s.sender.clone()) else {
            return Delivery::Closed;
        };

        match tokio::time::timeout(self.close_timeout, sender.send(Outbound::Text(payload))).await {
            Ok(Ok(())) => Delivery::Delivered,
            Ok(Err(_)) => {
                self.unregister(id);
                Delivery::Closed
            }
            Err(_) => {
                warn!(session = %id, "viewer queue stayed full, dropping response");
                Delivery::Dropped
            }
        }
    }

    /// Pushes `records` as a `vessel_updates` batch. Viewers subscribed to `all` receive every
    /// record, others only the vessels they subscribed to.
    ///
    /// Each distinct payload is serialized once.
    #[instrument(skip_all, fields(app.num_records = records.len(), app.num_sessions))]
    pub fn broadcast_updates(
        &self,
        records: &[VesselRecord],
        now: DateTime<Utc>,
    ) -> BroadcastReport {
        if records.is_empty() || self.sessions.is_empty() {
            return BroadcastReport::default();
        }

        let mut all: Option<Option<Arc<str>>> = None;
        let mut by_vessels: HashMap<Vec<Mmsi>, Option<Arc<str>>> = HashMap::new();

        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        for session in self.sessions.iter() {
            let subscriptions = &session.subscriptions;

            let payload = if subscriptions.all {
                all.get_or_insert_with(|| serialize(&ServerMessage::vessel_updates(records, now)))
                    .clone()
            } else {
                let key = subscriptions.vessels.iter().copied().collect_vec();
                by_vessels
                    .entry(key)
                    .or_insert_with(|| {
                        let matching = records
                            .iter()
                            .filter(|r| subscriptions.vessels.contains(&r.mmsi()))
                            .collect_vec();
                        if matching.is_empty() {
                            None
                        } else {
                            serialize(&ServerMessage::vessel_updates(matching, now))
                        }
                    })
                    .clone()
            };

            if let Some(payload) = payload {
                tally(
                    &mut report,
                    &mut closed,
                    *session.key(),
                    deliver(*session.key(), &session, payload),
                );
            }
        }

        tracing::Span::current().record("app.num_sessions", self.sessions.len());
        self.remove_closed(closed, &mut report);
        report
    }

    /// Pushes a `fleet_summary_update` to every viewer regardless of subscriptions.
    pub fn broadcast_summary(&self, summary: FleetSummary, now: DateTime<Utc>) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if self.sessions.is_empty() {
            return report;
        }

        let Some(payload) = serialize(&ServerMessage::FleetSummaryUpdate {
            timestamp: now,
            summary,
        }) else {
            return report;
        };

        let mut closed = Vec::new();
        for session in self.sessions.iter() {
            let id = *session.key();
            tally(
                &mut report,
                &mut closed,
                id,
                deliver(id, &session, payload.clone()),
            );
        }

        self.remove_closed(closed, &mut report);
        report
    }

    /// Sends a close frame to every viewer, waiting at most `close_timeout` for queue space,
    /// then cancels every session and empties the hub.
    pub async fn close_all(&self) {
        let ids = self.sessions.iter().map(|s| *s.key()).collect_vec();
        let sessions = ids
            .into_iter()
            .filter_map(|id| self.sessions.remove(&id))
            .map(|(_, session)| session)
            .collect_vec();

        if sessions.is_empty() {
            return;
        }

        let timeout = self.close_timeout;
        futures::future::join_all(sessions.iter().map(|session| async move {
            if tokio::time::timeout(timeout, session.sender.send(Outbound::Close))
                .await
                .is_err()
            {
                warn!("viewer did not accept close frame within {timeout:?}, forcing close");
            }
        }))
        .await;

        for session in &sessions {
            session.cancellation.cancel();
        }

        info!(num_sessions = sessions.len(), "closed all viewer sessions");
    }

    fn remove_closed(&self, closed: Vec<Uuid>, report: &mut BroadcastReport) {
        for id in closed {
            if self.unregister(id) {
                report.disconnected += 1;
                debug!(session = %id, "removed disconnected viewer");
            }
        }
    }
}

fn deliver(id: Uuid, session: &SessionHandle, payload: Arc<str>) -> Delivery {
    match session.sender.try_send(Outbound::Text(payload)) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Full(_)) => {
            debug!(session = %id, "viewer queue full, dropping message");
            Delivery::Dropped
        }
        Err(TrySendError::Closed(_)) => Delivery::Closed,
    }
}

fn tally(report: &mut BroadcastReport, closed: &mut Vec<Uuid>, id: Uuid, delivery: Delivery) {
    match delivery {
        Delivery::Delivered => report.delivered += 1,
        Delivery::Dropped => report.dropped += 1,
        Delivery::Closed => closed.push(id),
    }
}

fn serialize(message: &ServerMessage) -> Option<Arc<str>> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            error!("failed to serialize viewer message: {e:?}");
            None
        }
    }
}
