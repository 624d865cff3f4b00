use chrono::{DateTime, Utc};
use snafu::{OptionExt, ResultExt};
use tracker_core::{
    ImoNumber, Mmsi, NewPositionUpdate, PositionSource, PositionUpdate, VesselStatic,
    VesselStatus, VesselType,
};

use crate::{
    error::{
        ParseError,
        parse_error::{InvalidIdentitySnafu, InvalidPositionSnafu, JsonSnafu, MissingFieldSnafu},
    },
    models::{AisStreamMessage, AisStreamMessageType, MessageType, PositionReport, ShipStaticData},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    Position(PositionUpdate),
    Static(VesselStatic),
    /// A well-formed message of a type we do not track.
    Ignored,
}

/// Converts one raw aisstream message into a normalized update.
///
/// `received_at` is used for the update's ingest time and as message time when the message carries
/// none.
pub fn parse_message(raw: &str, received_at: DateTime<Utc>) -> Result<ParsedMessage, ParseError> {
    let message_type: MessageType = serde_json::from_str(raw).context(JsonSnafu)?;

    if message_type.message_type == AisStreamMessageType::Other {
        return Ok(ParsedMessage::Ignored);
    }

    let message: AisStreamMessage = serde_json::from_str(raw).context(JsonSnafu)?;
    let msgtime = message
        .metadata
        .time_utc
        .as_deref()
        .and_then(parse_time_utc)
        .unwrap_or(received_at);

    match message.message_type {
        AisStreamMessageType::PositionReport => {
            let report = message.message.position_report.context(MissingFieldSnafu {
                message_type: "PositionReport",
                field: "Message.PositionReport",
            })?;
            parse_position("PositionReport", report, &message.metadata, msgtime, received_at)
                .map(ParsedMessage::Position)
        }
        AisStreamMessageType::StandardClassBPositionReport => {
            let report = message
                .message
                .class_b_position_report
                .context(MissingFieldSnafu {
                    message_type: "StandardClassBPositionReport",
                    field: "Message.StandardClassBPositionReport",
                })?;
            parse_position(
                "StandardClassBPositionReport",
                report,
                &message.metadata,
                msgtime,
                received_at,
            )
            .map(ParsedMessage::Position)
        }
        AisStreamMessageType::ShipStaticData => {
            let data = message.message.ship_static_data.context(MissingFieldSnafu {
                message_type: "ShipStaticData",
                field: "Message.ShipStaticData",
            })?;
            parse_static(data, message.metadata.mmsi, msgtime).map(ParsedMessage::Static)
        }
        AisStreamMessageType::Other => Ok(ParsedMessage::Ignored),
    }
}

fn parse_position(
    message_type: &'static str,
    report: PositionReport,
    metadata: &crate::models::MetaData,
    msgtime: DateTime<Utc>,
    received_at: DateTime<Utc>,
) -> Result<PositionUpdate, ParseError> {
    let PositionReport {
        user_id,
        latitude,
        longitude,
        sog,
        cog,
        true_heading,
        navigational_status,
    } = report;

    let mmsi = user_id.or(metadata.mmsi).context(MissingFieldSnafu {
        message_type,
        field: "UserID",
    })?;
    let mmsi = Mmsi::try_from(mmsi).context(InvalidIdentitySnafu)?;
    let latitude = latitude.context(MissingFieldSnafu {
        message_type,
        field: "Latitude",
    })?;
    let longitude = longitude.context(MissingFieldSnafu {
        message_type,
        field: "Longitude",
    })?;

    PositionUpdate::new(NewPositionUpdate {
        mmsi,
        imo: None,
        name: metadata.ship_name.as_deref().and_then(clean_text),
        msgtime,
        received_at,
        latitude,
        longitude,
        speed_over_ground: sog,
        course_over_ground: cog,
        true_heading,
        status: navigational_status.map(VesselStatus::from_code),
        destination: None,
        eta: None,
        classification: VesselType::Unknown,
        source: PositionSource::Live,
    })
    .context(InvalidPositionSnafu)
}

fn parse_static(
    data: ShipStaticData,
    metadata_mmsi: Option<i64>,
    msgtime: DateTime<Utc>,
) -> Result<VesselStatic, ParseError> {
    let ShipStaticData {
        user_id,
        imo_number,
        name,
        call_sign,
        ship_type,
        destination,
        eta,
        dimension,
        maximum_static_draught,
    } = data;

    let mmsi = user_id.or(metadata_mmsi).context(MissingFieldSnafu {
        message_type: "ShipStaticData",
        field: "UserID",
    })?;
    let mmsi = Mmsi::try_from(mmsi).context(InvalidIdentitySnafu)?;
    let name = name.as_deref().and_then(clean_text);
    let classification = ship_type
        .map(|t| VesselType::from_ship_type(t, name.as_deref()))
        .unwrap_or_default();

    Ok(VesselStatic {
        mmsi,
        msgtime,
        imo: imo_number.and_then(ImoNumber::new),
        classification,
        name,
        call_sign: call_sign.as_deref().and_then(clean_text),
        destination: destination.as_deref().and_then(clean_text),
        eta: eta.and_then(|e| e.to_eta_string()),
        draught: maximum_static_draught.filter(|d| *d > 0.0),
        length: dimension.and_then(|d| d.length()),
        width: dimension.and_then(|d| d.width()),
    })
}

/// aisstream formats timestamps as `2022-12-29 18:22:32.318353 +0000 UTC`, RFC 3339 is accepted
/// as well.
pub fn parse_time_utc(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim().trim_end_matches(" UTC");
    DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f %z")
        .or_else(|_| DateTime::parse_from_rfc3339(value.trim()))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// AIS text fields are padded with spaces or `@`.
fn clean_text(value: &str) -> Option<String> {
    let cleaned = value.trim_matches(|c: char| c.is_whitespace() || c == '@');
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
