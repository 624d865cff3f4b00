use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use strum::{AsRefStr, EnumIter, EnumString};

use crate::{
    Error,
    error::error::{InvalidMmsiSnafu, ParseIdentifierSnafu},
};

const MAX_MMSI: i64 = 999_999_999;

/// Maritime Mobile Service Identity, the primary key of a tracked vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Mmsi(i32);

/// IMO registry number. Advisory only, a vessel is never keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ImoNumber(i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VesselIdentity {
    pub mmsi: Mmsi,
    pub imo: Option<ImoNumber>,
}

/// Vessel category used for fleet summaries. Once a vessel has been classified as anything other
/// than `Unknown` the classification is kept.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    AsRefStr,
    EnumString,
    EnumIter,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VesselType {
    Tanker,
    Bulker,
    Container,
    GeneralCargo,
    Fishing,
    Passenger,
    Tug,
    Other,
    #[default]
    Unknown,
}

/// Voyage and ship related data reported by the live feed roughly every 6th minute.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselStatic {
    pub mmsi: Mmsi,
    pub msgtime: DateTime<Utc>,
    pub imo: Option<ImoNumber>,
    pub name: Option<String>,
    pub call_sign: Option<String>,
    pub classification: VesselType,
    pub destination: Option<String>,
    pub eta: Option<String>,
    pub draught: Option<f64>,
    pub length: Option<i32>,
    pub width: Option<i32>,
}

impl Mmsi {
    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Mmsi {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (1..=MAX_MMSI).contains(&value) {
            Ok(Self(value as i32))
        } else {
            InvalidMmsiSnafu { value }.fail()
        }
    }
}

impl FromStr for Mmsi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .ok()
            .context(ParseIdentifierSnafu { value: s })?;
        Self::try_from(value)
    }
}

impl From<Mmsi> for i32 {
    fn from(value: Mmsi) -> Self {
        value.0
    }
}

impl Display for Mmsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ImoNumber {
    pub fn new(value: i32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl FromStr for ImoNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("IMO")
            .or_else(|| trimmed.strip_prefix("imo"))
            .unwrap_or(trimmed);

        digits
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(ImoNumber::new)
            .context(ParseIdentifierSnafu { value: s })
    }
}

impl Display for ImoNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IMO{}", self.0)
    }
}

impl VesselIdentity {
    pub fn new(mmsi: Mmsi) -> Self {
        Self { mmsi, imo: None }
    }

    pub fn with_imo(mut self, imo: Option<ImoNumber>) -> Self {
        self.imo = imo;
        self
    }
}

impl VesselType {
    /// Maps an AIS ship-and-cargo type code to a vessel category. Cargo ships (70-79) are split
    /// into container and bulk carriers based on their name as the code itself does not carry
    /// that distinction.
    pub fn from_ship_type(ship_type: i32, name: Option<&str>) -> Self {
        match ship_type {
            0 => Self::Unknown,
            30 => Self::Fishing,
            31 | 32 | 52 => Self::Tug,
            60..=69 => Self::Passenger,
            70..=79 => {
                let name = name.map(|n| n.to_lowercase()).unwrap_or_default();
                if name.contains("container") {
                    Self::Container
                } else if name.contains("bulk") {
                    Self::Bulker
                } else {
                    Self::GeneralCargo
                }
            }
            80..=89 => Self::Tanker,
            _ => Self::Other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

#[cfg(any(test, feature = "test"))]
mod test {
    use super::*;

    impl Mmsi {
        pub fn test_new(mmsi: i32) -> Self {
            Self(mmsi)
        }
    }

    impl VesselStatic {
        pub fn test_default(mmsi: Mmsi) -> VesselStatic {
            VesselStatic {
                mmsi,
                msgtime: Utc::now(),
                imo: ImoNumber::new(9_321_483),
                name: Some("NORDIC CONTAINER".to_string()),
                call_sign: Some("LK45".to_string()),
                classification: VesselType::Container,
                destination: Some("ROTTERDAM".to_string()),
                eta: Some("12-24 06:00".to_string()),
                draught: Some(11.5),
                length: Some(294),
                width: Some(32),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmsi_rejects_out_of_range_values() {
        assert!(Mmsi::try_from(0).is_err());
        assert!(Mmsi::try_from(1_000_000_000).is_err());
        assert!(Mmsi::try_from(-5).is_err());
        assert_eq!(Mmsi::try_from(123456789).unwrap().into_inner(), 123456789);
    }

    #[test]
    fn test_mmsi_parses_from_string() {
        assert_eq!("123456789".parse::<Mmsi>().unwrap().into_inner(), 123456789);
        assert!("abc".parse::<Mmsi>().is_err());
    }

    #[test]
    fn test_imo_number_accepts_prefixed_and_plain_values() {
        assert_eq!("IMO7000001".parse::<ImoNumber>().unwrap().into_inner(), 7000001);
        assert_eq!("7000001".parse::<ImoNumber>().unwrap().into_inner(), 7000001);
        assert_eq!(ImoNumber::new(7000001).unwrap().to_string(), "IMO7000001");
        assert!("IMO".parse::<ImoNumber>().is_err());
    }

    #[test]
    fn test_ship_type_classification() {
        assert_eq!(VesselType::from_ship_type(84, None), VesselType::Tanker);
        assert_eq!(
            VesselType::from_ship_type(71, Some("Ever Container")),
            VesselType::Container
        );
        assert_eq!(
            VesselType::from_ship_type(70, Some("Pacific Bulk")),
            VesselType::Bulker
        );
        assert_eq!(VesselType::from_ship_type(70, None), VesselType::GeneralCargo);
        assert_eq!(VesselType::from_ship_type(30, None), VesselType::Fishing);
        assert_eq!(VesselType::from_ship_type(0, None), VesselType::Unknown);
        assert_eq!(VesselType::from_ship_type(99, None), VesselType::Other);
    }

    #[test]
    fn test_vessel_type_serializes_as_snake_case() {
        assert_eq!(VesselType::GeneralCargo.as_ref(), "general_cargo");
        assert_eq!(
            serde_json::to_string(&VesselType::GeneralCargo).unwrap(),
            "\"general_cargo\""
        );
    }
}
