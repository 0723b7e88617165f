use crate::metadata::GpsCoordinates;
use exif::{Tag, Value};
use std::collections::HashMap;

/// Raw fields of an image's GPS IFD, keyed by tag.
#[derive(Debug, Default, Clone)]
pub struct GpsBlock {
    fields: HashMap<Tag, Value>,
}

impl GpsBlock {
    pub fn insert(&mut self, tag: Tag, value: Value) {
        self.fields.insert(tag, value);
    }

    pub fn get(&self, tag: Tag) -> Option<&Value> {
        self.fields.get(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Signed decimal coordinates from the block, or `None` when latitude,
/// longitude or either hemisphere reference is missing or malformed.
pub fn decode(block: &GpsBlock) -> Option<GpsCoordinates> {
    let latitude = coordinate(block, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'N', 'S')?;
    let longitude = coordinate(block, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'E', 'W')?;
    Some(GpsCoordinates {
        latitude,
        longitude,
        altitude: altitude(block),
    })
}

/// degrees + minutes/60 + seconds/3600
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn coordinate(
    block: &GpsBlock,
    value_tag: Tag,
    ref_tag: Tag,
    positive: char,
    negative: char,
) -> Option<f64> {
    let magnitude = match block.get(value_tag)? {
        Value::Rational(dms) if dms.len() == 3 => {
            if dms.iter().any(|r| r.denom == 0) {
                log::debug!("Zero denominator in {}", value_tag);
                return None;
            }
            dms_to_decimal(dms[0].to_f64(), dms[1].to_f64(), dms[2].to_f64())
        }
        other => {
            log::debug!("Unexpected {} value: {:?}", value_tag, other);
            return None;
        }
    };

    let reference = match block.get(ref_tag)? {
        Value::Ascii(strings) => strings
            .first()
            .and_then(|s| s.first())
            .map(|&b| (b as char).to_ascii_uppercase())?,
        other => {
            log::debug!("Unexpected {} value: {:?}", ref_tag, other);
            return None;
        }
    };

    if reference == positive {
        Some(magnitude)
    } else if reference == negative {
        Some(-magnitude)
    } else {
        log::debug!("Unknown hemisphere reference {:?} for {}", reference, value_tag);
        None
    }
}

fn altitude(block: &GpsBlock) -> Option<f64> {
    let meters = match block.get(Tag::GPSAltitude)? {
        Value::Rational(r) if !r.is_empty() && r[0].denom != 0 => r[0].to_f64(),
        _ => return None,
    };
    let below_sea_level = matches!(
        block.get(Tag::GPSAltitudeRef),
        Some(Value::Byte(b)) if b.first() == Some(&1)
    );
    Some(if below_sea_level { -meters } else { meters })
}
