use std::sync::{Arc, Once};

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use registry::{RegistrySettings, VesselRegistry};
use simulator::{RouteMotionSimulator, SimulationSettings};
use tracing_subscriber::FmtSubscriber;
use tracker_core::{UpsertOutcome, VesselInbound, default_routes};

static TRACING: Once = Once::new();

pub struct TestHelper {
    pub registry: Arc<VesselRegistry>,
    pub simulator: RouteMotionSimulator,
    pub start: DateTime<Utc>,
}

impl TestHelper {
    /// Runs one simulation tick `elapsed` after the start and feeds every update through the
    /// registry's merge rule.
    pub fn tick(&mut self, elapsed: chrono::Duration) -> Vec<UpsertOutcome> {
        let updates = self.simulator.tick(self.start + elapsed, |_| None);
        updates
            .into_iter()
            .map(|u| self.registry.upsert(u))
            .collect()
    }

    /// Like [`TestHelper::tick`], but vessels with fresh live data in the registry follow it
    /// instead of being simulated.
    pub fn tick_with_live(&mut self, elapsed: chrono::Duration) -> Vec<UpsertOutcome> {
        let now = self.start + elapsed;
        let registry = &self.registry;
        let updates = self
            .simulator
            .tick(now, |mmsi| registry.fresh_live_position_at(mmsi, now));
        updates.into_iter().map(|u| registry.upsert(u)).collect()
    }
}

pub fn test<T>(settings: SimulationSettings, test_closure: T)
where
    T: FnOnce(TestHelper),
{
    TRACING.call_once(|| {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_max_level(tracing::Level::INFO)
                .finish(),
        )
        .unwrap();
    });

    let start = Utc::now();
    let routes = default_routes().into_iter().map(Arc::new).collect::<Vec<_>>();
    let simulator = RouteMotionSimulator::generate(
        &settings,
        &routes,
        StdRng::seed_from_u64(settings.seed.unwrap_or(1)),
        start,
    )
    .unwrap();

    test_closure(TestHelper {
        registry: Arc::new(VesselRegistry::new(&RegistrySettings::default())),
        simulator,
        start,
    });
}
