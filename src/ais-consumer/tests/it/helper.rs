use std::{
    panic,
    sync::{Arc, Once},
    time::Duration,
};

use ais_consumer::{
    Result,
    models::AisStreamMessage,
    settings::AisStreamSettings,
    startup::{LiveFeed, ingest_loop},
};
use futures::Future;
use registry::{RegistrySettings, VesselRegistry};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing_subscriber::FmtSubscriber;
use tracker_core::{LiveFeedStats, Mmsi, VesselOutbound, VesselRecord};

static TRACING: Once = Once::new();

pub struct TestHelper {
    pub ais_source: AisSource,
    pub registry: Arc<VesselRegistry>,
    pub stats: Arc<LiveFeedStats>,
}

pub struct AisSource {
    out: tokio::sync::mpsc::Sender<String>,
}

impl TestHelper {
    /// Waits until `condition` holds for the vessel, the consumer commits in batches so updates
    /// are not visible immediately.
    pub async fn wait_for_vessel<F>(&self, mmsi: i32, condition: F) -> VesselRecord
    where
        F: Fn(&VesselRecord) -> bool,
    {
        let mmsi = Mmsi::test_new(mmsi);
        for _ in 0..200 {
            if let Some(record) = self.registry.get(mmsi) {
                if condition(&record) {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("vessel {mmsi} never reached the expected state");
    }

    pub async fn wait_for_parse_failures(&self, expected: u64) {
        for _ in 0..200 {
            if self.stats.snapshot(chrono::Utc::now()).parse_failures >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {expected} parse failures");
    }
}

pub async fn test<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut + panic::UnwindSafe + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    TRACING.call_once(|| {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_max_level(tracing::Level::INFO)
                .finish(),
        )
        .unwrap();
    });

    let settings = AisStreamSettings {
        api_key: None,
        url: "ws://127.0.0.1:1".to_string(),
        bounding_boxes: vec![],
        message_types: vec![],
        reconnect_delay: Duration::from_millis(10),
        commit_interval: Duration::from_millis(5),
        ingest_buffer_size: 10,
    };

    let stats = Arc::new(LiveFeedStats::default());
    let registry = Arc::new(VesselRegistry::new(&RegistrySettings::default()));

    let feed = LiveFeed::build(&settings, stats.clone());
    tokio::spawn(ingest_loop(feed.receiver(), registry.clone()));

    let (sender, recv) = tokio::sync::mpsc::channel(100);
    let source = ReceiverStream::new(recv).map(Ok::<String, ais_consumer::Error>);
    tokio::spawn(async move {
        let _: Result<()> = feed.run_test(source).await;
    });

    let helper = TestHelper {
        ais_source: AisSource { out: sender },
        registry,
        stats,
    };

    test_closure(helper).await;
}

impl AisSource {
    pub async fn send_message(&self, message: &AisStreamMessage) {
        self.send_string(message.to_json()).await
    }

    pub async fn send_string(&self, val: String) {
        self.out.send(val).await.unwrap();
    }
}
