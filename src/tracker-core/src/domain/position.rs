use chrono::{DateTime, Utc};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use snafu::ensure;
use strum::{AsRefStr, EnumString};

use crate::{
    CoreResult, ImoNumber, Mmsi, VesselIdentity, VesselType,
    error::error::{LatitudeOutOfRangeSnafu, LongitudeOutOfRangeSnafu},
};

/// Heading value AIS transponders report when no heading is available.
pub const HEADING_NOT_AVAILABLE: f64 = 511.0;
/// Course over ground of 360 or above means "not available".
pub const COURSE_NOT_AVAILABLE: f64 = 360.0;
/// Speed over ground of 102.3 knots means "not available".
pub const SPEED_NOT_AVAILABLE: f64 = 102.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PositionSource {
    Live,
    Simulated,
}

/// Raw AIS navigational status as transmitted by vessels.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    FromPrimitive,
    Eq,
    Serialize_repr,
    Deserialize_repr,
    strum::Display,
    AsRefStr,
    EnumString,
)]
#[repr(i32)]
pub enum NavigationStatus {
    UnderWayUsingEngine = 0,
    AtAnchor = 1,
    NotUnderCommand = 2,
    RestrictedManoeuverability = 3,
    ConstrainedByDraught = 4,
    Moored = 5,
    Aground = 6,
    EngagedInFishing = 7,
    UnderWaySailing = 8,
    Reserved9 = 9,
    Reserved10 = 10,
    PowerDrivenTowingAstern = 11,
    PowerDrivenPushingAhead = 12,
    Reserved13 = 13,
    AisSartIsActive = 14,
    NotDefined = 15,
}

/// The small closed status set exposed to viewers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VesselStatus {
    Underway,
    Anchored,
    Moored,
    UnknownOther,
}

/// Unvalidated input for a [`PositionUpdate`].
#[derive(Debug, Clone)]
pub struct NewPositionUpdate {
    pub mmsi: Mmsi,
    pub imo: Option<ImoNumber>,
    pub name: Option<String>,
    pub msgtime: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<f64>,
    pub status: Option<VesselStatus>,
    pub destination: Option<String>,
    pub eta: Option<String>,
    pub classification: VesselType,
    pub source: PositionSource,
}

/// A validated, point-in-time observation of a vessel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionUpdate {
    identity: VesselIdentity,
    name: Option<String>,
    msgtime: DateTime<Utc>,
    received_at: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    speed_over_ground: Option<f64>,
    course_over_ground: Option<f64>,
    true_heading: Option<f64>,
    status: Option<VesselStatus>,
    destination: Option<String>,
    eta: Option<String>,
    classification: VesselType,
    source: PositionSource,
}

impl NavigationStatus {
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_i32(code)
    }
}

impl From<NavigationStatus> for VesselStatus {
    fn from(value: NavigationStatus) -> Self {
        match value {
            NavigationStatus::AtAnchor => VesselStatus::Anchored,
            NavigationStatus::Moored => VesselStatus::Moored,
            NavigationStatus::NotDefined => VesselStatus::UnknownOther,
            NavigationStatus::UnderWayUsingEngine
            | NavigationStatus::NotUnderCommand
            | NavigationStatus::RestrictedManoeuverability
            | NavigationStatus::ConstrainedByDraught
            | NavigationStatus::Aground
            | NavigationStatus::EngagedInFishing
            | NavigationStatus::UnderWaySailing
            | NavigationStatus::Reserved9
            | NavigationStatus::Reserved10
            | NavigationStatus::PowerDrivenTowingAstern
            | NavigationStatus::PowerDrivenPushingAhead
            | NavigationStatus::Reserved13
            | NavigationStatus::AisSartIsActive => VesselStatus::Underway,
        }
    }
}

impl VesselStatus {
    /// Codes outside of the AIS table default to `Underway`.
    pub fn from_code(code: i32) -> Self {
        NavigationStatus::from_code(code)
            .map(VesselStatus::from)
            .unwrap_or(VesselStatus::Underway)
    }

    pub fn is_stationary(&self) -> bool {
        matches!(self, VesselStatus::Moored | VesselStatus::Anchored)
    }
}

impl PositionUpdate {
    pub fn new(new: NewPositionUpdate) -> CoreResult<Self> {
        let NewPositionUpdate {
            mmsi,
            imo,
            name,
            msgtime,
            received_at,
            latitude,
            longitude,
            speed_over_ground,
            course_over_ground,
            true_heading,
            status,
            destination,
            eta,
            classification,
            source,
        } = new;

        ensure!(
            (-90.0..=90.0).contains(&latitude),
            LatitudeOutOfRangeSnafu { latitude }
        );
        ensure!(
            (-180.0..=180.0).contains(&longitude),
            LongitudeOutOfRangeSnafu { longitude }
        );

        Ok(Self {
            identity: VesselIdentity::new(mmsi).with_imo(imo),
            name: name.filter(|n| !n.trim().is_empty()),
            msgtime,
            received_at,
            latitude,
            longitude,
            speed_over_ground: speed_over_ground
                .filter(|v| v.is_finite() && *v >= 0.0 && *v < SPEED_NOT_AVAILABLE),
            course_over_ground: course_over_ground
                .filter(|v| v.is_finite() && *v >= 0.0 && *v < COURSE_NOT_AVAILABLE),
            true_heading: true_heading
                .filter(|v| v.is_finite() && *v >= 0.0 && *v < COURSE_NOT_AVAILABLE),
            status,
            destination: destination.filter(|d| !d.trim().is_empty()),
            eta: eta.filter(|e| !e.trim().is_empty()),
            classification,
            source,
        })
    }

    pub fn identity(&self) -> &VesselIdentity {
        &self.identity
    }
    pub fn mmsi(&self) -> Mmsi {
        self.identity.mmsi
    }
    pub fn imo(&self) -> Option<ImoNumber> {
        self.identity.imo
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn msgtime(&self) -> DateTime<Utc> {
        self.msgtime
    }
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
    pub fn latitude(&self) -> f64 {
        self.latitude
    }
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
    pub fn speed_over_ground(&self) -> Option<f64> {
        self.speed_over_ground
    }
    pub fn course_over_ground(&self) -> Option<f64> {
        self.course_over_ground
    }
    pub fn true_heading(&self) -> Option<f64> {
        self.true_heading
    }
    pub fn status(&self) -> Option<VesselStatus> {
        self.status
    }
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
    pub fn eta(&self) -> Option<&str> {
        self.eta.as_deref()
    }
    pub fn classification(&self) -> VesselType {
        self.classification
    }
    pub fn source(&self) -> PositionSource {
        self.source
    }
    pub fn is_live(&self) -> bool {
        self.source == PositionSource::Live
    }
}

#[cfg(any(test, feature = "test"))]
mod test {
    use super::*;

    impl NewPositionUpdate {
        pub fn test_default(
            mmsi: Mmsi,
            source: PositionSource,
            received_at: DateTime<Utc>,
        ) -> NewPositionUpdate {
            NewPositionUpdate {
                mmsi,
                imo: None,
                name: None,
                msgtime: received_at,
                received_at,
                latitude: 51.9225,
                longitude: 4.4792,
                speed_over_ground: Some(12.3),
                course_over_ground: Some(270.0),
                true_heading: Some(268.0),
                status: Some(VesselStatus::Underway),
                destination: None,
                eta: None,
                classification: VesselType::Unknown,
                source,
            }
        }
    }

    impl PositionUpdate {
        pub fn test_new(
            mmsi: Mmsi,
            source: PositionSource,
            received_at: DateTime<Utc>,
        ) -> PositionUpdate {
            PositionUpdate::new(NewPositionUpdate::test_default(mmsi, source, received_at))
                .unwrap()
        }

        pub fn test_at(
            mmsi: Mmsi,
            source: PositionSource,
            received_at: DateTime<Utc>,
            latitude: f64,
            longitude: f64,
        ) -> PositionUpdate {
            let mut new = NewPositionUpdate::test_default(mmsi, source, received_at);
            new.latitude = latitude;
            new.longitude = longitude;
            PositionUpdate::new(new).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_status_maps_to_closed_status_set() {
        assert_eq!(VesselStatus::from_code(0), VesselStatus::Underway);
        assert_eq!(VesselStatus::from_code(1), VesselStatus::Anchored);
        assert_eq!(VesselStatus::from_code(5), VesselStatus::Moored);
        assert_eq!(VesselStatus::from_code(7), VesselStatus::Underway);
        assert_eq!(VesselStatus::from_code(15), VesselStatus::UnknownOther);
    }

    #[test]
    fn test_unmapped_navigation_status_defaults_to_underway() {
        assert_eq!(VesselStatus::from_code(42), VesselStatus::Underway);
        assert_eq!(VesselStatus::from_code(-1), VesselStatus::Underway);
    }

    #[test]
    fn test_position_update_rejects_out_of_range_coordinates() {
        let now = Utc::now();
        let mmsi = Mmsi::test_new(123456789);

        let mut new = NewPositionUpdate::test_default(mmsi, PositionSource::Live, now);
        new.latitude = 90.5;
        assert!(PositionUpdate::new(new).is_err());

        let mut new = NewPositionUpdate::test_default(mmsi, PositionSource::Live, now);
        new.longitude = -180.01;
        assert!(PositionUpdate::new(new).is_err());

        let mut new = NewPositionUpdate::test_default(mmsi, PositionSource::Live, now);
        new.latitude = -90.0;
        new.longitude = 180.0;
        assert!(PositionUpdate::new(new).is_ok());
    }

    #[test]
    fn test_position_update_normalizes_not_available_sentinels() {
        let mut new = NewPositionUpdate::test_default(
            Mmsi::test_new(123456789),
            PositionSource::Live,
            Utc::now(),
        );
        new.true_heading = Some(HEADING_NOT_AVAILABLE);
        new.course_over_ground = Some(COURSE_NOT_AVAILABLE);
        new.speed_over_ground = Some(SPEED_NOT_AVAILABLE);

        let update = PositionUpdate::new(new).unwrap();
        assert_eq!(update.true_heading(), None);
        assert_eq!(update.course_over_ground(), None);
        assert_eq!(update.speed_over_ground(), None);
    }

    #[test]
    fn test_nan_coordinates_are_rejected() {
        let mut new = NewPositionUpdate::test_default(
            Mmsi::test_new(123456789),
            PositionSource::Live,
            Utc::now(),
        );
        new.latitude = f64::NAN;
        assert!(PositionUpdate::new(new).is_err());
    }
}
