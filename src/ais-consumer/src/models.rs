use serde::{Deserialize, Serialize};

/// `[[lat, lon], [lat, lon]]` corners of a rectangular area.
pub type BoundingBox = [[f64; 2]; 2];

/// Sent once after connecting, aisstream closes the connection if it is not received within a few
/// seconds.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription<'a> {
    #[serde(rename = "APIKey")]
    pub api_key: &'a str,
    #[serde(rename = "BoundingBoxes")]
    pub bounding_boxes: &'a [BoundingBox],
    #[serde(rename = "FilterMessageTypes")]
    pub filter_message_types: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum AisStreamMessageType {
    PositionReport,
    StandardClassBPositionReport,
    ShipStaticData,
    #[serde(other)]
    Other,
}

/// Convenience struct to deserialize the message type prior to attempting to deserialize the full
/// message.
#[derive(Debug, Deserialize)]
pub struct MessageType {
    #[serde(rename = "MessageType")]
    pub message_type: AisStreamMessageType,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AisStreamMessage {
    #[serde(rename = "MessageType")]
    pub message_type: AisStreamMessageType,
    #[serde(rename = "MetaData", default)]
    pub metadata: MetaData,
    #[serde(rename = "Message", default)]
    pub message: MessageBody,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetaData {
    #[serde(rename = "MMSI")]
    pub mmsi: Option<i64>,
    #[serde(rename = "ShipName")]
    pub ship_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Formatted as `2022-12-29 18:22:32.318353 +0000 UTC`.
    pub time_utc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessageBody {
    #[serde(rename = "PositionReport", skip_serializing_if = "Option::is_none")]
    pub position_report: Option<PositionReport>,
    #[serde(
        rename = "StandardClassBPositionReport",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_b_position_report: Option<PositionReport>,
    #[serde(rename = "ShipStaticData", skip_serializing_if = "Option::is_none")]
    pub ship_static_data: Option<ShipStaticData>,
}

/// Position data emitted every few seconds by moving vessels.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PositionReport {
    #[serde(rename = "UserID")]
    pub user_id: Option<i64>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Sog")]
    pub sog: Option<f64>,
    #[serde(rename = "Cog")]
    pub cog: Option<f64>,
    #[serde(rename = "TrueHeading")]
    pub true_heading: Option<f64>,
    /// Absent on class B reports.
    #[serde(rename = "NavigationalStatus")]
    pub navigational_status: Option<i32>,
}

/// Vessel related data emitted every 6th minute.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShipStaticData {
    #[serde(rename = "UserID")]
    pub user_id: Option<i64>,
    #[serde(rename = "ImoNumber")]
    pub imo_number: Option<i32>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "CallSign")]
    pub call_sign: Option<String>,
    #[serde(rename = "Type")]
    pub ship_type: Option<i32>,
    #[serde(rename = "Destination")]
    pub destination: Option<String>,
    #[serde(rename = "Eta")]
    pub eta: Option<Eta>,
    #[serde(rename = "Dimension")]
    pub dimension: Option<Dimension>,
    #[serde(rename = "MaximumStaticDraught")]
    pub maximum_static_draught: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Eta {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Minute")]
    pub minute: u32,
}

/// Distances in meters from the position reference point to bow (A), stern (B), port (C) and
/// starboard (D).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Dimension {
    #[serde(rename = "A")]
    pub a: i32,
    #[serde(rename = "B")]
    pub b: i32,
    #[serde(rename = "C")]
    pub c: i32,
    #[serde(rename = "D")]
    pub d: i32,
}

impl Eta {
    /// Returns `None` for the "not available" default values.
    /// See https://gpsd.gitlab.io/gpsd/AIVDM.html#_type_5_static_and_voyage_related_data
    pub fn to_eta_string(&self) -> Option<String> {
        if self.month == 0
            || self.month > 12
            || self.day == 0
            || self.day > 31
            || self.hour >= 24
            || self.minute >= 60
        {
            return None;
        }
        Some(format!(
            "{:02}-{:02} {:02}:{:02}",
            self.month, self.day, self.hour, self.minute
        ))
    }
}

impl Dimension {
    pub fn length(&self) -> Option<i32> {
        let length = self.a + self.b;
        (length > 0).then_some(length)
    }

    pub fn width(&self) -> Option<i32> {
        let width = self.c + self.d;
        (width > 0).then_some(width)
    }
}

#[cfg(any(test, feature = "test"))]
mod test {
    use chrono::{DateTime, Utc};

    use super::*;

    impl AisStreamMessage {
        pub fn test_position(mmsi: i64, latitude: f64, longitude: f64) -> AisStreamMessage {
            AisStreamMessage {
                message_type: AisStreamMessageType::PositionReport,
                metadata: MetaData {
                    mmsi: Some(mmsi),
                    ship_name: Some("NORDIC CONTAINER    ".to_string()),
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    time_utc: Some("2022-12-29 18:22:32.318353 +0000 UTC".to_string()),
                },
                message: MessageBody {
                    position_report: Some(PositionReport {
                        user_id: Some(mmsi),
                        latitude: Some(latitude),
                        longitude: Some(longitude),
                        sog: Some(12.3),
                        cog: Some(270.1),
                        true_heading: Some(271.0),
                        navigational_status: Some(0),
                    }),
                    ..Default::default()
                },
            }
        }

        pub fn test_static(mmsi: i64) -> AisStreamMessage {
            AisStreamMessage {
                message_type: AisStreamMessageType::ShipStaticData,
                metadata: MetaData {
                    mmsi: Some(mmsi),
                    ship_name: Some("EVER GIVEN".to_string()),
                    latitude: None,
                    longitude: None,
                    time_utc: Some(Self::test_time_utc(Utc::now())),
                },
                message: MessageBody {
                    ship_static_data: Some(ShipStaticData {
                        user_id: Some(mmsi),
                        imo_number: Some(9811000),
                        name: Some("EVER GIVEN".to_string()),
                        call_sign: Some("H3RC".to_string()),
                        ship_type: Some(71),
                        destination: Some("ROTTERDAM".to_string()),
                        eta: Some(Eta {
                            month: 12,
                            day: 24,
                            hour: 6,
                            minute: 0,
                        }),
                        dimension: Some(Dimension {
                            a: 300,
                            b: 100,
                            c: 30,
                            d: 29,
                        }),
                        maximum_static_draught: Some(14.5),
                    }),
                    ..Default::default()
                },
            }
        }

        pub fn test_time_utc(time: DateTime<Utc>) -> String {
            time.format("%Y-%m-%d %H:%M:%S%.6f +0000 UTC").to_string()
        }

        pub fn to_json(&self) -> String {
            serde_json::to_string(self).unwrap()
        }
    }
}
