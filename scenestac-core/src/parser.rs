use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, NaiveDate, Utc};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ParseError::{
    BadDate, MalformedIdentifier, MissingAttribute, MissingGeometry, UnknownSensor,
};
use crate::ParseResult;
use crate::index::SceneRecord;
use crate::model::{NodeTemplate, is_path_segment, midnight};

/// Attribute of an index record holding the scene identifier.
pub const NAME_ATTRIBUTE: &str = "NAME";

/// Number of leading identifier characters naming the sensor.
const SENSOR_CODE_LEN: usize = 2;

/// A `[start, end)` character range inside a scene identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<[usize; 2]> for Span {
    fn from([start, end]: [usize; 2]) -> Self {
        Self { start, end }
    }
}

impl From<Span> for [usize; 2] {
    fn from(span: Span) -> Self {
        [span.start, span.end]
    }
}

/// Where the acquisition date and the grouping period live inside an identifier.
///
/// A Geobase scene name looks like `S4_07603_4652_20060115_m20_lcc00`:
/// the date is at `14..22` and the year at `14..18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierFormat {
    pub date: Span,
    pub period: Span,
}

impl Default for IdentifierFormat {
    fn default() -> Self {
        Self {
            date: Span::new(14, 22),
            period: Span::new(14, 18),
        }
    }
}

/// Everything the catalog knows about one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// The collection the sensor's scenes are published in.
    pub collection: NodeTemplate,
    #[serde(default)]
    pub identifier: IdentifierFormat,
    /// Collection-level properties such as platform, instruments and bands.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

/// Known sensors keyed by their two-character identifier prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorTable(BTreeMap<String, SensorSpec>);

impl SensorTable {
    #[must_use]
    pub fn new(sensors: BTreeMap<String, SensorSpec>) -> Self {
        Self(sensors)
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&SensorSpec> {
        self.0.get(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SensorSpec)> for SensorTable {
    fn from_iter<T: IntoIterator<Item = (String, SensorSpec)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The structured view of one index record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScene {
    pub index: usize,
    pub id: String,
    pub sensor_code: String,
    pub acquisition_date: NaiveDate,
    /// `{sensor_code}_{period}`, the key of the period catalog the scene belongs to.
    pub year_key: String,
    /// Geometry in the source CRS, exactly as read.
    pub geometry: Geometry,
}

impl ParsedScene {
    #[must_use]
    pub fn datetime(&self) -> DateTime<Utc> {
        midnight(self.acquisition_date)
    }
}

/// Reads the scene identifier of a record, if any.
#[must_use]
pub fn record_name<'a>(record: &SceneRecord<'a>) -> Option<&'a str> {
    record
        .properties
        .and_then(|p| p.get(NAME_ATTRIBUTE))
        .and_then(Value::as_str)
}

pub fn parse(record: &SceneRecord<'_>, sensors: &SensorTable) -> ParseResult<ParsedScene> {
    let name = record_name(record).ok_or(MissingAttribute(NAME_ATTRIBUTE))?;
    let geometry = record.geometry.ok_or(MissingGeometry)?;
    if !name.is_ascii() {
        return Err(MalformedIdentifier(
            name.to_string(),
            "contains non-ASCII characters",
        ));
    }
    if !is_path_segment(name) {
        return Err(MalformedIdentifier(
            name.to_string(),
            "is not usable as a path segment",
        ));
    }

    let sensor_code = name
        .get(..SENSOR_CODE_LEN)
        .ok_or_else(|| MalformedIdentifier(name.to_string(), "too short for a sensor code"))?;
    let sensor = sensors
        .get(sensor_code)
        .ok_or_else(|| UnknownSensor(sensor_code.to_string()))?;
    let format = sensor.identifier;

    let date = name
        .get(format.date.range())
        .ok_or_else(|| MalformedIdentifier(name.to_string(), "too short for an acquisition date"))?;
    let acquisition_date =
        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|e| BadDate(date.to_string(), e))?;
    let period = name
        .get(format.period.range())
        .ok_or_else(|| MalformedIdentifier(name.to_string(), "too short for a period key"))?;

    Ok(ParsedScene {
        index: record.index,
        id: name.to_string(),
        sensor_code: sensor_code.to_string(),
        acquisition_date,
        year_key: format!("{sensor_code}_{period}"),
        geometry: geometry.clone(),
    })
}
