use chrono::Utc;
use tracker_core::{Mmsi, PositionSource, PositionUpdate, VesselInbound, VesselOutbound};

use crate::helper::{TestHelper, test_with_settings};

/// Keeps the tick loop from broadcasting during the test.
fn no_ticks(settings: &mut live_server::settings::Settings) {
    settings.simulation.tick_interval = std::time::Duration::from_secs(3600);
}

fn broadcast_five(helper: &TestHelper) -> usize {
    let since = helper.registry.change_sequence();
    for i in 1..=5 {
        helper.registry.upsert(PositionUpdate::test_at(
            Mmsi::test_new(257_000_000 + i),
            PositionSource::Live,
            Utc::now(),
            60.0 + i as f64 / 10.0,
            5.0,
        ));
    }
    let records = helper
        .registry
        .updated_since(since)
        .into_iter()
        .filter(|r| r.source() == PositionSource::Live)
        .collect::<Vec<_>>();
    assert_eq!(records.len(), 5);

    helper.hub.broadcast_updates(&records, Utc::now()).delivered
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_viewer_receives_the_whole_batch() {
    test_with_settings(no_ticks, |helper| async move {
        let (mut a, _) = helper.connect().await;
        let (mut b, _) = helper.connect().await;
        let (mut c, _) = helper.connect().await;

        assert_eq!(broadcast_five(&helper), 3);

        for viewer in [&mut a, &mut b, &mut c] {
            let updates = viewer.next_of_type("vessel_updates").await;
            assert_eq!(updates["update_count"], 5);
            assert_eq!(updates["updates"].as_array().unwrap().len(), 5);
        }
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnecting_viewer_does_not_affect_the_others() {
    test_with_settings(no_ticks, |helper| async move {
        let (mut a, _) = helper.connect().await;
        let (b, _) = helper.connect().await;
        let (mut c, _) = helper.connect().await;

        b.close().await;
        broadcast_five(&helper);

        for viewer in [&mut a, &mut c] {
            let updates = viewer.next_of_type("vessel_updates").await;
            assert_eq!(updates["update_count"], 5);
        }

        helper.wait_for_clients(2).await;
        assert_eq!(broadcast_five(&helper), 2);
        for viewer in [&mut a, &mut c] {
            viewer.next_of_type("vessel_updates").await;
        }
    })
    .await;
}
