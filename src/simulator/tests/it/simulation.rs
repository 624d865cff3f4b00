use chrono::Duration;
use simulator::SimulationSettings;
use tracker_core::{
    Mmsi, PositionSource, PositionUpdate, UpsertOutcome, VesselInbound, VesselOutbound,
};

use crate::helper::test;

fn single_vessel(mmsi: i64) -> SimulationSettings {
    SimulationSettings {
        fleet_size: 1,
        mmsi_base: mmsi,
        seed: Some(17),
        ..Default::default()
    }
}

#[test]
fn test_simulated_tick_never_overrides_fresh_live_position() {
    test(single_vessel(123_456_789), |mut helper| {
        let mmsi = Mmsi::test_new(123_456_789);
        let live = PositionUpdate::test_at(
            mmsi,
            PositionSource::Live,
            helper.start,
            51.9225,
            4.4792,
        );
        assert_eq!(helper.registry.upsert(live), UpsertOutcome::Created);

        let outcomes = helper.tick(Duration::seconds(15));
        assert_eq!(outcomes, vec![UpsertOutcome::Discarded]);

        let record = helper.registry.get(mmsi).unwrap();
        assert_eq!(record.source(), PositionSource::Live);
        assert_eq!(record.current().latitude(), 51.9225);
        assert_eq!(record.current().longitude(), 4.4792);
        assert_eq!(record.history_len(), 1);
    });
}

#[test]
fn test_simulation_resumes_after_live_data_goes_stale() {
    test(single_vessel(123_456_789), |mut helper| {
        let mmsi = Mmsi::test_new(123_456_789);
        let live = PositionUpdate::test_at(
            mmsi,
            PositionSource::Live,
            helper.start,
            51.9225,
            4.4792,
        );
        helper.registry.upsert(live);

        // Default live window is one hour.
        let outcomes = helper.tick(Duration::minutes(61));
        assert_eq!(outcomes, vec![UpsertOutcome::Updated]);
        assert_eq!(
            helper.registry.get(mmsi).unwrap().source(),
            PositionSource::Simulated
        );
    });
}

#[test]
fn test_simulation_continues_from_the_last_live_fix() {
    test(single_vessel(123_456_789), |mut helper| {
        let mmsi = Mmsi::test_new(123_456_789);
        helper.registry.upsert(PositionUpdate::test_at(
            mmsi,
            PositionSource::Live,
            helper.start,
            51.9225,
            4.4792,
        ));

        assert!(helper.tick_with_live(Duration::seconds(15)).is_empty());
        assert!(helper.tick_with_live(Duration::minutes(59)).is_empty());

        let outcomes = helper.tick_with_live(Duration::minutes(61));
        assert_eq!(outcomes, vec![UpsertOutcome::Updated]);

        let current = helper.registry.get(mmsi).unwrap().current().clone();
        assert_eq!(current.source(), PositionSource::Simulated);
        let moved = tracker_core::geo::distance_nm(
            51.9225,
            4.4792,
            current.latitude(),
            current.longitude(),
        );
        // Two minutes at no more than 25 knots.
        assert!(moved < 1.0, "{moved}");
    });
}

#[test]
fn test_simulated_fleet_is_tracked_by_the_registry() {
    let settings = SimulationSettings {
        fleet_size: 40,
        seed: Some(99),
        ..Default::default()
    };
    test(settings, |mut helper| {
        let outcomes = helper.tick(Duration::seconds(15));
        assert!(outcomes.iter().all(|o| *o == UpsertOutcome::Created));
        assert_eq!(helper.registry.len(), 40);

        let outcomes = helper.tick(Duration::seconds(30));
        assert!(outcomes.iter().all(|o| *o == UpsertOutcome::Updated));

        for record in helper.registry.active_snapshot(std::time::Duration::from_secs(3600)) {
            assert_eq!(record.source(), PositionSource::Simulated);
            assert_eq!(record.history_len(), 2);
        }
    });
}
