//! JSON messages exchanged with viewers over `/ws`.
//!
//! Every frame is a JSON object with a `type` field, requests are read from text frames and
//! responses and pushes are written as text frames.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracker_core::{
    ImoNumber, LiveStatus, Mmsi, PositionSource, VesselRecord, VesselStatus, VesselType,
};
use uuid::Uuid;

use crate::summary::FleetSummary;

/// Viewer -> server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Subscribe {
        #[serde(alias = "subscription_type")]
        topic: Topic,
    },
    GetVessel {
        #[serde(default, alias = "mmsi")]
        identity: Option<VesselQuery>,
        #[serde(default, deserialize_with = "deserialize_imo")]
        imo_number: Option<ImoNumber>,
    },
    GetFleetSummary,
    GetLiveStatus,
}

/// Server -> viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionEstablished {
        client_id: Uuid,
        timestamp: DateTime<Utc>,
        message: String,
        fleet_summary: FleetSummary,
    },
    VesselUpdates {
        timestamp: DateTime<Utc>,
        update_count: usize,
        updates: Vec<VesselUpdate>,
    },
    FleetSummaryUpdate {
        timestamp: DateTime<Utc>,
        summary: FleetSummary,
    },
    SubscriptionConfirmed {
        topic: Topic,
        timestamp: DateTime<Utc>,
    },
    VesselData {
        identity: VesselQuery,
        vessel: Option<VesselData>,
        timestamp: DateTime<Utc>,
    },
    FleetSummary {
        summary: FleetSummary,
        timestamp: DateTime<Utc>,
    },
    LiveStatus {
        status: LiveStatus,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

/// What a viewer subscribes to, either every vessel or a single MMSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "RawIdentifier", into = "String")]
pub enum Topic {
    All,
    Vessel(Mmsi),
}

/// Identifies a vessel in `get_vessel`, either by MMSI or by `IMO<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "RawIdentifier", into = "String")]
pub enum VesselQuery {
    Mmsi(Mmsi),
    Imo(ImoNumber),
}

/// Viewers send identifiers both as JSON numbers and strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawIdentifier {
    Number(i64),
    Text(String),
}

/// The current state of a vessel as pushed in `vessel_updates`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselUpdate {
    pub mmsi: Mmsi,
    pub imo_number: Option<ImoNumber>,
    pub name: Option<String>,
    pub vessel_type: VesselType,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<f64>,
    pub status: Option<VesselStatus>,
    pub destination: Option<String>,
    pub eta: Option<String>,
    pub source: PositionSource,
    pub timestamp: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Everything known about a single vessel, returned by `get_vessel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselData {
    #[serde(flatten)]
    pub current: VesselUpdate,
    pub call_sign: Option<String>,
    pub draught: Option<f64>,
    pub length: Option<i32>,
    pub width: Option<i32>,
    pub first_seen: DateTime<Utc>,
    pub last_live_update: Option<DateTime<Utc>>,
    pub track: Vec<TrackPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_over_ground: Option<f64>,
    pub source: PositionSource,
    pub timestamp: DateTime<Utc>,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn vessel_updates<'a>(
        records: impl IntoIterator<Item = &'a VesselRecord>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let updates: Vec<VesselUpdate> = records.into_iter().map(VesselUpdate::from).collect();
        Self::VesselUpdates {
            timestamp,
            update_count: updates.len(),
            updates,
        }
    }
}

impl ClientRequest {
    /// The vessel a `get_vessel` request refers to, `identity` wins over `imo_number`.
    pub fn vessel_query(
        identity: Option<VesselQuery>,
        imo: Option<ImoNumber>,
    ) -> Option<VesselQuery> {
        identity.or(imo.map(VesselQuery::Imo))
    }
}

impl From<&VesselRecord> for VesselUpdate {
    fn from(record: &VesselRecord) -> Self {
        let current = record.current();
        let details = record.details();

        Self {
            mmsi: record.mmsi(),
            imo_number: record.imo(),
            name: record.name().map(ToOwned::to_owned),
            vessel_type: record.classification(),
            latitude: current.latitude(),
            longitude: current.longitude(),
            speed_over_ground: current.speed_over_ground(),
            course_over_ground: current.course_over_ground(),
            true_heading: current.true_heading(),
            status: current.status(),
            destination: current
                .destination()
                .map(ToOwned::to_owned)
                .or_else(|| details.destination.clone()),
            eta: current
                .eta()
                .map(ToOwned::to_owned)
                .or_else(|| details.eta.clone()),
            source: current.source(),
            timestamp: current.msgtime(),
            last_updated: record.last_updated(),
        }
    }
}

impl From<&VesselRecord> for VesselData {
    fn from(record: &VesselRecord) -> Self {
        let details = record.details();
        Self {
            current: VesselUpdate::from(record),
            call_sign: details.call_sign.clone(),
            draught: details.draught,
            length: details.length,
            width: details.width,
            first_seen: record.first_seen(),
            last_live_update: record.last_live_update(),
            track: record
                .history()
                .map(|p| TrackPoint {
                    latitude: p.latitude(),
                    longitude: p.longitude(),
                    speed_over_ground: p.speed_over_ground(),
                    source: p.source(),
                    timestamp: p.msgtime(),
                })
                .collect(),
        }
    }
}

impl TryFrom<RawIdentifier> for Topic {
    type Error = tracker_core::Error;

    fn try_from(value: RawIdentifier) -> Result<Self, Self::Error> {
        match value {
            RawIdentifier::Number(n) => Ok(Topic::Vessel(Mmsi::try_from(n)?)),
            RawIdentifier::Text(s) => s.parse(),
        }
    }
}

impl FromStr for Topic {
    type Err = tracker_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Topic::All)
        } else {
            Ok(Topic::Vessel(s.parse()?))
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::All => f.write_str("all"),
            Topic::Vessel(mmsi) => write!(f, "{mmsi}"),
        }
    }
}

impl From<Topic> for String {
    fn from(value: Topic) -> Self {
        value.to_string()
    }
}

impl TryFrom<RawIdentifier> for VesselQuery {
    type Error = tracker_core::Error;

    fn try_from(value: RawIdentifier) -> Result<Self, Self::Error> {
        match value {
            RawIdentifier::Number(n) => Ok(VesselQuery::Mmsi(Mmsi::try_from(n)?)),
            RawIdentifier::Text(s) => s.parse(),
        }
    }
}

impl FromStr for VesselQuery {
    type Err = tracker_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let is_imo = trimmed
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("imo"));
        if is_imo {
            Ok(VesselQuery::Imo(trimmed.parse()?))
        } else {
            Ok(VesselQuery::Mmsi(trimmed.parse()?))
        }
    }
}

impl fmt::Display for VesselQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VesselQuery::Mmsi(mmsi) => write!(f, "{mmsi}"),
            VesselQuery::Imo(imo) => write!(f, "{imo}"),
        }
    }
}

impl From<VesselQuery> for String {
    fn from(value: VesselQuery) -> Self {
        value.to_string()
    }
}

fn deserialize_imo<'de, D>(deserializer: D) -> Result<Option<ImoNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawIdentifier>::deserialize(deserializer)?;
    let imo = match raw {
        None => return Ok(None),
        Some(RawIdentifier::Number(n)) => i32::try_from(n).ok().and_then(ImoNumber::new),
        Some(RawIdentifier::Text(s)) => s.parse().ok(),
    };
    imo.map(Some)
        .ok_or_else(|| serde::de::Error::custom("invalid imo number"))
}
