use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ReprojectionError::{self, InvalidCrs};
use crate::ReprojectionResult;

const WGS84_CODE: u16 = 4326;

/// A coordinate reference system, either an EPSG code or a raw PROJ.4 definition.
///
/// Parses `EPSG:3979`, `urn:ogc:def:crs:EPSG::3979`, `WGS84`/`CRS84` and
/// `+proj=...` strings. EPSG codes are resolved with the `crs-definitions` database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    Epsg(u16),
    Proj(String),
}

impl Crs {
    /// The canonical geographic CRS every published geometry is expressed in.
    pub const WGS84: Self = Self::Epsg(WGS84_CODE);

    /// PROJ.4 definition used to build the transform.
    pub fn proj_definition(&self) -> ReprojectionResult<Cow<'_, str>> {
        match self {
            Self::Epsg(code) => crs_definitions::from_code(*code)
                .map(|def| Cow::Borrowed(def.proj4))
                .ok_or_else(|| {
                    InvalidCrs(
                        self.to_string(),
                        "not found in the EPSG definitions database".to_string(),
                    )
                }),
            Self::Proj(def) => Ok(Cow::Borrowed(def.as_str())),
        }
    }

    /// True for longitude/latitude systems, whose coordinates are in degrees.
    pub fn is_geographic(&self) -> ReprojectionResult<bool> {
        let def = self.proj_definition()?;
        Ok(def.contains("+proj=longlat") || def.contains("+proj=latlong"))
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::WGS84
    }
}

impl FromStr for Crs {
    type Err = ReprojectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.starts_with('+') {
            return Ok(Self::Proj(value.to_string()));
        }
        let upper = value.to_ascii_uppercase();
        if matches!(
            upper.as_str(),
            "WGS84" | "WGS 84" | "CRS84" | "OGC:CRS84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84"
        ) {
            return Ok(Self::WGS84);
        }

        // EPSG:3979, urn:ogc:def:crs:EPSG::3979, urn:ogc:def:crs:EPSG:6.6:3979
        let code = upper
            .strip_prefix("EPSG:")
            .or_else(|| {
                upper
                    .strip_prefix("URN:OGC:DEF:CRS:EPSG:")
                    .and_then(|rest| rest.rsplit(':').next())
            })
            .ok_or_else(|| InvalidCrs(value.to_string(), "unrecognized CRS notation".to_string()))?;

        code.parse::<u16>()
            .map(Self::Epsg)
            .map_err(|e| InvalidCrs(value.to_string(), format!("bad EPSG code: {e}")))
    }
}

impl TryFrom<String> for Crs {
    type Error = ReprojectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
            Self::Proj(def) => f.write_str(def),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("EPSG:3979", Crs::Epsg(3979))]
    #[case("epsg:32617", Crs::Epsg(32617))]
    #[case("urn:ogc:def:crs:EPSG::3979", Crs::Epsg(3979))]
    #[case("urn:ogc:def:crs:EPSG:6.6:3857", Crs::Epsg(3857))]
    #[case("WGS84", Crs::WGS84)]
    #[case("urn:ogc:def:crs:OGC:1.3:CRS84", Crs::WGS84)]
    #[case(
        "+proj=utm +zone=17 +datum=WGS84",
        Crs::Proj("+proj=utm +zone=17 +datum=WGS84".to_string())
    )]
    fn parse_crs(#[case] input: &str, #[case] expected: Crs) {
        assert_eq!(input.parse::<Crs>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("EPSG:")]
    #[case("EPSG:99999999")]
    #[case("NAD83 / Canada Atlas Lambert")]
    fn reject_bad_crs(#[case] input: &str) {
        assert!(matches!(input.parse::<Crs>(), Err(InvalidCrs(..))));
    }

    #[test]
    fn geographic_detection() {
        assert!(Crs::WGS84.is_geographic().unwrap());
        assert!(!Crs::Epsg(3857).is_geographic().unwrap());
        assert!(
            Crs::Proj("+proj=longlat +ellps=GRS80".to_string())
                .is_geographic()
                .unwrap()
        );
    }

    #[test]
    fn display_round_trip() {
        let crs: Crs = "urn:ogc:def:crs:EPSG::3979".parse().unwrap();
        assert_eq!(crs.to_string(), "EPSG:3979");
        assert_eq!(crs.to_string().parse::<Crs>().unwrap(), crs);
    }
}
