use std::{sync::Arc, time::Duration};

use async_channel::{Receiver, Sender};
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use tracker_core::{DataMessage, LiveFeedStats, VesselInbound};

use crate::{
    aisstream::AisStreamClient,
    consumer::Consumer,
    error::{Error, Result},
    settings::AisStreamSettings,
};

/// Owns the upstream connection and keeps it alive until cancelled.
pub struct LiveFeed {
    consumer: Consumer,
    client: Option<AisStreamClient>,
    reconnect_delay: Duration,
    sender: Sender<DataMessage>,
    receiver: Receiver<DataMessage>,
}

impl LiveFeed {
    /// The feed runs without a client (and never connects) when no api key is configured.
    pub fn build(settings: &AisStreamSettings, stats: Arc<LiveFeedStats>) -> LiveFeed {
        let (sender, receiver) = async_channel::bounded(settings.ingest_buffer_size.max(1));

        let client = settings.api_key().map(|key| {
            AisStreamClient::new(
                settings.url.clone(),
                key.to_string(),
                settings.bounding_boxes.clone(),
                settings.message_types.clone(),
            )
        });
        stats.set_enabled(client.is_some());

        LiveFeed {
            consumer: Consumer::new(settings.commit_interval, stats),
            client,
            reconnect_delay: settings.reconnect_delay,
            sender,
            receiver,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn receiver(&self) -> Receiver<DataMessage> {
        self.receiver.clone()
    }

    /// Consumes the upstream feed until `cancellation` fires, reconnecting after
    /// `reconnect_delay` whenever the connection fails or is closed.
    pub async fn run(self, cancellation: CancellationToken) {
        let Some(client) = self.client.as_ref() else {
            info!("no aisstream api key configured, live feed disabled");
            return;
        };

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = self.run_impl(client) => {}
            }
            self.consumer.stats().mark_disconnected();

            tokio::select! {
                _ = cancellation.cancelled() => break,
                // If the ais api is unresponsive we dont want to relentlessly spam it
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.consumer.stats().mark_disconnected();
        info!("live feed stopped");
    }

    #[instrument(skip_all)]
    async fn run_impl(&self, client: &AisStreamClient) {
        if let Err(e) = self.run_inner(client).await {
            match e {
                // The ingest loop is gone, nothing will consume what we produce.
                Error::ChannelClosed { .. } => error!("live feed ingest channel closed: {e:?}"),
                _ => error!("consumer failed: {e:?}"),
            }
        }
    }

    async fn run_inner(&self, client: &AisStreamClient) -> Result<()> {
        let source = client.streamer().await?;
        self.consumer
            .stats()
            .mark_connected(chrono::Utc::now());
        self.consumer.run(source, self.sender.clone()).await
    }

    /// Runs the consumer against an arbitrary source, used by tests to stand in for the upstream
    /// websocket.
    pub async fn run_test<S>(self, source: S) -> Result<()>
    where
        S: Stream<Item = Result<String>>,
    {
        self.consumer
            .stats()
            .mark_connected(chrono::Utc::now());
        self.consumer.run(source, self.sender).await
    }
}

/// Applies every batch received on `receiver` to the registry until the channel closes.
///
/// A single task applies all updates, which preserves arrival order per vessel.
pub async fn ingest_loop(receiver: Receiver<DataMessage>, inbound: Arc<dyn VesselInbound>) {
    while let Ok(message) = receiver.recv().await {
        apply(message, inbound.as_ref());
    }
    info!("ingest channel closed, stopping ingest loop");
}

#[instrument(skip_all, fields(app.num_positions, app.num_static))]
fn apply(message: DataMessage, inbound: &dyn VesselInbound) {
    let DataMessage {
        positions,
        static_messages,
    } = message;

    let num_positions = positions.len() as u64;
    for position in positions {
        inbound.upsert(position);
    }

    let mut num_static: u64 = 0;
    for vessel in static_messages {
        if inbound.apply_static(vessel) {
            num_static += 1;
        }
    }

    let span = tracing::Span::current();
    span.record("app.num_positions", num_positions);
    span.record("app.num_static", num_static);
}
