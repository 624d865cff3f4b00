use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::Rng;
use registry::VesselRegistry;
use simulator::RouteMotionSimulator;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use tracker_core::{UpsertOutcome, VesselOutbound};

use crate::{hub::BroadcastHub, summary::FleetSummary};

/// Drives the simulation, evicts stale vessels and pushes what changed to viewers.
pub struct Ticker {
    registry: Arc<VesselRegistry>,
    hub: Arc<BroadcastHub>,
    simulator: RouteMotionSimulator,
    tick_interval: Duration,
    summary_probability: f64,
    /// Change sequence of the registry when the previous broadcast was read.
    last_broadcast: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub simulated: usize,
    pub discarded: usize,
    pub evicted: usize,
    pub broadcast: usize,
    pub summary_sent: bool,
}

impl Ticker {
    pub fn new(
        registry: Arc<VesselRegistry>,
        hub: Arc<BroadcastHub>,
        simulator: RouteMotionSimulator,
        tick_interval: Duration,
        summary_probability: f64,
    ) -> Self {
        Self {
            registry,
            hub,
            simulator,
            tick_interval,
            summary_probability: summary_probability.clamp(0.0, 1.0),
            last_broadcast: 0,
        }
    }

    pub async fn run(mut self, cancellation: CancellationToken) {
        // The first tick runs when the app is built.
        let mut interval = tokio::time::interval_at(
            tokio::time::Instant::now() + self.tick_interval,
            self.tick_interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = interval.tick() => {
                    let send_summary = rand::rng().random_bool(self.summary_probability);
                    self.tick(Utc::now(), send_summary);
                }
            }
        }

        info!("tick loop stopped");
    }

    #[instrument(skip_all, fields(app.simulated, app.evicted, app.broadcast))]
    pub fn tick(&mut self, now: DateTime<Utc>, send_summary: bool) -> TickReport {
        let mut report = TickReport::default();

        let registry = &self.registry;
        let updates = self
            .simulator
            .tick(now, |mmsi| registry.fresh_live_position_at(mmsi, now));
        report.simulated = updates.len();
        for update in updates {
            if registry.upsert_update(update) == UpsertOutcome::Discarded {
                report.discarded += 1;
            }
        }

        report.evicted = self.registry.evict_stale_at(now, self.registry.max_age());

        // Changes applied while reading are either in this batch or the next one, at worst both.
        let mark = self.registry.change_sequence();
        let changed = self.registry.updated_since(self.last_broadcast);
        report.broadcast = changed.len();
        self.hub.broadcast_updates(&changed, now);
        self.last_broadcast = mark;

        if send_summary {
            let active = self.registry.active_snapshot_at(now, self.registry.max_age());
            let summary = FleetSummary::generate(&active, self.hub.len(), self.tick_interval);
            self.hub.broadcast_summary(summary, now);
            report.summary_sent = true;
        }

        let span = tracing::Span::current();
        span.record("app.simulated", report.simulated);
        span.record("app.evicted", report.evicted);
        span.record("app.broadcast", report.broadcast);

        report
    }
}
