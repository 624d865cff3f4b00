use ais_consumer::models::AisStreamMessage;
use tracker_core::{PositionSource, VesselOutbound, VesselType};

use crate::helper::test;

#[tokio::test(flavor = "multi_thread")]
async fn test_position_reports_are_added_to_the_registry() {
    test(|helper| async move {
        let message = AisStreamMessage::test_position(123456789, 51.9225, 4.4792);
        helper.ais_source.send_message(&message).await;

        let record = helper.wait_for_vessel(123456789, |_| true).await;
        assert_eq!(record.source(), PositionSource::Live);
        assert_eq!(record.current().latitude(), 51.9225);
        assert_eq!(record.current().longitude(), 4.4792);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_messages_are_dropped_and_counted() {
    test(|helper| async move {
        helper.ais_source.send_string("{garbage".to_string()).await;
        helper
            .ais_source
            .send_message(&AisStreamMessage::test_position(123456789, 95.0, 4.4792))
            .await;
        helper
            .ais_source
            .send_message(&AisStreamMessage::test_position(987654321, 60.0, 5.0))
            .await;

        helper.wait_for_parse_failures(2).await;
        helper.wait_for_vessel(987654321, |_| true).await;

        assert_eq!(helper.registry.len(), 1);
        assert_eq!(
            helper.stats.snapshot(chrono::Utc::now()).messages_received,
            3
        );
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_static_data_enriches_existing_vessels_only() {
    test(|helper| async move {
        helper
            .ais_source
            .send_message(&AisStreamMessage::test_static(111111111))
            .await;
        helper
            .ais_source
            .send_message(&AisStreamMessage::test_position(123456789, 51.9225, 4.4792))
            .await;
        helper.wait_for_vessel(123456789, |_| true).await;

        helper
            .ais_source
            .send_message(&AisStreamMessage::test_static(123456789))
            .await;

        let record = helper
            .wait_for_vessel(123456789, |r| r.imo().is_some())
            .await;
        assert_eq!(record.name(), Some("EVER GIVEN"));
        assert_eq!(record.classification(), VesselType::GeneralCargo);
        assert_eq!(record.details().destination.as_deref(), Some("ROTTERDAM"));
        assert_eq!(helper.registry.len(), 1);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_later_reports_replace_the_current_position() {
    test(|helper| async move {
        helper
            .ais_source
            .send_message(&AisStreamMessage::test_position(123456789, 51.0, 4.0))
            .await;
        helper
            .ais_source
            .send_message(&AisStreamMessage::test_position(123456789, 52.0, 5.0))
            .await;

        let record = helper
            .wait_for_vessel(123456789, |r| r.current().latitude() == 52.0)
            .await;
        assert_eq!(record.history_len(), 2);
        let lats: Vec<f64> = record.history().map(|u| u.latitude()).collect();
        assert_eq!(lats, vec![51.0, 52.0]);
    })
    .await;
}
