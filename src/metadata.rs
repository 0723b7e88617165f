// src/metadata.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

pub type ExifMap = BTreeMap<String, ExifValue>;

/// A normalized EXIF value, always representable as JSON.
///
/// `Unrepresentable` serializes as the string `"Error: <reason>"`, so parsing
/// JSON back cannot tell it apart from a text tag that itself starts with
/// `"Error: "`; such text comes back as `Unrepresentable`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Nested(ExifMap),
    /// The tag was present but could not be converted; holds the reason.
    Unrepresentable(String),
}

const ERROR_MARKER_PREFIX: &str = "Error: ";

impl Serialize for ExifValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExifValue::Integer(n) => serializer.serialize_i64(*n),
            ExifValue::Float(f) => serializer.serialize_f64(*f),
            ExifValue::Boolean(b) => serializer.serialize_bool(*b),
            ExifValue::Text(s) => serializer.serialize_str(s),
            ExifValue::Nested(map) => map.serialize(serializer),
            ExifValue::Unrepresentable(reason) => {
                serializer.serialize_str(&format!("{}{}", ERROR_MARKER_PREFIX, reason))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExifValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Nested(BTreeMap<String, RawExifValue>),
}

impl From<RawExifValue> for ExifValue {
    fn from(raw: RawExifValue) -> Self {
        match raw {
            RawExifValue::Boolean(b) => ExifValue::Boolean(b),
            RawExifValue::Integer(n) => ExifValue::Integer(n),
            RawExifValue::Float(f) => ExifValue::Float(f),
            RawExifValue::Text(s) => match s.strip_prefix(ERROR_MARKER_PREFIX) {
                Some(reason) => ExifValue::Unrepresentable(reason.to_string()),
                None => ExifValue::Text(s),
            },
            RawExifValue::Nested(map) => {
                ExifValue::Nested(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for ExifValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawExifValue::deserialize(deserializer).map(ExifValue::from)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GpsCoordinates {
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Altitude", default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// Everything extracted from one image file. Only `filename` is guaranteed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageRecord {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Format", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "Mode", default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "Size", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<(u32, u32)>,
    #[serde(rename = "Creation Date", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(rename = "Modification Date", default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(rename = "Exif Data", default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifMap>,
    #[serde(rename = "GPS Data", default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsCoordinates>,
    #[serde(rename = "Hashes", default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<BTreeMap<String, String>>,
}

impl ImageRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            format: None,
            mode: None,
            size: None,
            created: None,
            modified: None,
            exif: None,
            gps: None,
            hashes: None,
        }
    }
}

/// Records in the order their files were enumerated.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct MetadataCollection {
    records: Vec<ImageRecord>,
}

impl MetadataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ImageRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageRecord> {
        self.records.iter()
    }
}

impl FromIterator<ImageRecord> for MetadataCollection {
    fn from_iter<I: IntoIterator<Item = ImageRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}
