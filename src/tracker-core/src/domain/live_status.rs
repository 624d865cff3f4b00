use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health counters for the upstream live feed, shared between the consumer and the viewer-facing
/// server.
#[derive(Debug, Default)]
pub struct LiveFeedStats {
    enabled: AtomicBool,
    connected: AtomicBool,
    connected_at_millis: AtomicI64,
    last_message_millis: AtomicI64,
    messages_received: AtomicU64,
    messages_at_connect: AtomicU64,
    parse_failures: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStatus {
    pub enabled: bool,
    pub connected: bool,
    pub connected_at: Option<DateTime<Utc>>,
    pub messages_received: u64,
    pub parse_failures: u64,
    pub message_rate_per_second: f64,
    pub last_message_time: Option<DateTime<Utc>>,
}

impl LiveFeedStats {
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn mark_connected(&self, now: DateTime<Utc>) {
        self.connected_at_millis
            .store(now.timestamp_millis(), Ordering::Relaxed);
        self.messages_at_connect.store(
            self.messages_received.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.connected.store(true, Ordering::Relaxed);
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    pub fn record_message(&self, now: DateTime<Utc>) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.last_message_millis
            .store(now.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> LiveStatus {
        let connected = self.is_connected();
        let connected_at = millis_to_datetime(self.connected_at_millis.load(Ordering::Relaxed));
        let messages_received = self.messages_received.load(Ordering::Relaxed);
        let since_connect =
            messages_received.saturating_sub(self.messages_at_connect.load(Ordering::Relaxed));

        let message_rate_per_second = match (connected, connected_at) {
            (true, Some(at)) => {
                let elapsed = now.signed_duration_since(at).num_milliseconds() as f64 / 1000.0;
                if elapsed > 0.0 {
                    since_connect as f64 / elapsed
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        LiveStatus {
            enabled: self.is_enabled(),
            connected,
            connected_at,
            messages_received,
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            message_rate_per_second,
            last_message_time: millis_to_datetime(self.last_message_millis.load(Ordering::Relaxed)),
        }
    }
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        None
    } else {
        DateTime::from_timestamp_millis(millis)
    }
}
