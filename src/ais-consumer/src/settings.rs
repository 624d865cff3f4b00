use std::time::Duration;

use serde::Deserialize;

use crate::{aisstream::DEFAULT_AISSTREAM_URL, models::BoundingBox};

#[derive(Deserialize, Debug, Clone)]
pub struct AisStreamSettings {
    /// The live feed is disabled when no key is configured.
    pub api_key: Option<String>,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_bounding_boxes")]
    pub bounding_boxes: Vec<BoundingBox>,
    #[serde(default = "default_message_types")]
    pub message_types: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub reconnect_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub commit_interval: Duration,
    pub ingest_buffer_size: usize,
}

impl AisStreamSettings {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

fn default_url() -> String {
    DEFAULT_AISSTREAM_URL.to_string()
}

fn default_bounding_boxes() -> Vec<BoundingBox> {
    vec![[[-90.0, -180.0], [90.0, 180.0]]]
}

fn default_message_types() -> Vec<String> {
    vec!["PositionReport".to_string(), "ShipStaticData".to_string()]
}
