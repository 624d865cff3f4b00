use chrono::Utc;
use serde_json::json;
use tokio_tungstenite::tungstenite;
use tracker_core::{
    Mmsi, PositionSource, PositionUpdate, VesselInbound, VesselStatic,
};

use crate::helper::{test, test_with_settings};

#[tokio::test(flavor = "multi_thread")]
async fn test_viewer_receives_connection_established_with_summary() {
    test(|helper| async move {
        let (_viewer, welcome) = helper.connect().await;

        assert!(welcome["client_id"].is_string());
        let summary = &welcome["fleet_summary"];
        assert_eq!(summary["connected_clients"], 1);
        assert!(summary["total_vessels"].is_u64());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fleet_summary_counts_live_and_simulated_vessels() {
    test(|helper| async move {
        helper.registry.upsert(PositionUpdate::test_at(
            Mmsi::test_new(123_456_789),
            PositionSource::Live,
            Utc::now(),
            51.9225,
            4.4792,
        ));

        let (mut viewer, _) = helper.connect().await;
        viewer.send(json!({"type": "get_fleet_summary"})).await;

        let response = viewer.next_of_type("fleet_summary").await;
        let summary = &response["summary"];
        let total = summary["total_vessels"].as_u64().unwrap();
        let live = summary["live_vessels"].as_u64().unwrap();
        let simulated = summary["simulated_vessels"].as_u64().unwrap();

        assert_eq!(total, live + simulated);
        assert_eq!(live, 1);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_viewers_receive_periodic_vessel_updates() {
    test(|helper| async move {
        let (mut viewer, _) = helper.connect().await;

        let updates = viewer.next_of_type("vessel_updates").await;
        assert_eq!(updates["update_count"], 10);
        let first = &updates["updates"][0];
        assert_eq!(first["source"], "simulated");
        assert!(first["name"].as_str().unwrap().starts_with("SIM "));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_vessel_by_mmsi_and_imo() {
    test(|helper| async move {
        let mmsi = Mmsi::test_new(123_456_789);
        helper.registry.upsert(PositionUpdate::test_at(
            mmsi,
            PositionSource::Live,
            Utc::now(),
            51.9225,
            4.4792,
        ));
        assert!(helper.registry.apply_static(VesselStatic::test_default(mmsi)));

        let (mut viewer, _) = helper.connect().await;

        viewer
            .send(json!({"type": "get_vessel", "identity": 123456789}))
            .await;
        let response = viewer.next_of_type("vessel_data").await;
        assert_eq!(response["identity"], "123456789");
        assert_eq!(response["vessel"]["latitude"], 51.9225);
        assert_eq!(response["vessel"]["source"], "live");

        viewer
            .send(json!({"type": "get_vessel", "imo_number": "IMO9321483"}))
            .await;
        let response = viewer.next_of_type("vessel_data").await;
        assert_eq!(response["vessel"]["mmsi"], 123_456_789);

        viewer
            .send(json!({"type": "get_vessel", "mmsi": "111111111"}))
            .await;
        let response = viewer.next_of_type("vessel_data").await;
        assert!(response["vessel"].is_null());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subscribe_is_confirmed() {
    test(|helper| async move {
        let (mut viewer, _) = helper.connect().await;

        viewer
            .send(json!({"type": "subscribe", "topic": "123456789"}))
            .await;
        let response = viewer.next_of_type("subscription_confirmed").await;
        assert_eq!(response["topic"], "123456789");

        viewer
            .send(json!({"type": "subscribe", "subscription_type": "all"}))
            .await;
        let response = viewer.next_of_type("subscription_confirmed").await;
        assert_eq!(response["topic"], "all");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_requests_get_an_error_and_keep_the_session() {
    test(|helper| async move {
        let (mut viewer, _) = helper.connect().await;

        viewer.send_text("{not json".to_string()).await;
        let error = viewer.next_of_type("error").await;
        assert!(error["message"].as_str().unwrap().contains("invalid request"));

        viewer.send(json!({"type": "warp_speed"})).await;
        viewer.next_of_type("error").await;

        viewer.send(json!({"type": "get_vessel"})).await;
        let error = viewer.next_of_type("error").await;
        assert_eq!(error["message"], "get_vessel requires an identity");

        viewer.send(json!({"type": "get_live_status"})).await;
        let status = viewer.next_of_type("live_status").await;
        assert_eq!(status["status"]["enabled"], false);
        assert_eq!(status["status"]["connected"], false);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_reports_clients() {
    test(|helper| async move {
        let (_viewer, _) = helper.connect().await;

        let response = helper.get("/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains(r#""status":"ok""#), "{response}");
        assert!(response.contains(r#""clients":1"#), "{response}");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connections_beyond_max_clients_are_rejected() {
    test_with_settings(
        |settings| settings.broadcast.max_clients = 1,
        |helper| async move {
            let (_first, _) = helper.connect().await;

            match helper.try_connect().await {
                Err(tungstenite::Error::Http(response)) => {
                    assert_eq!(response.status(), 503);
                }
                Err(e) => panic!("unexpected error: {e}"),
                Ok(_) => panic!("second viewer was accepted"),
            }
        },
    )
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_simultaneous_connections_respect_max_clients() {
    test_with_settings(
        |settings| settings.broadcast.max_clients = 2,
        |helper| async move {
            let attempts = futures::future::join_all((0..6).map(|_| helper.try_connect())).await;

            let mut accepted = Vec::new();
            for attempt in attempts {
                match attempt {
                    Ok(viewer) => accepted.push(viewer),
                    Err(tungstenite::Error::Http(response)) => {
                        assert_eq!(response.status(), 503);
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(accepted.len(), 2);
        },
    )
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_sends_close_frames() {
    test(|helper| async move {
        let (mut viewer, _) = helper.connect().await;

        helper.cancellation.cancel();
        assert!(viewer.wait_for_close().await);
    })
    .await;
}
