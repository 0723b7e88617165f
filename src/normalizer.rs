use crate::gps::GpsBlock;
use crate::metadata::{ExifMap, ExifValue};
use exif::{Context, Field, In, Tag, Value};

/// Reserved key under which the GPS IFD is nested.
pub const GPS_INFO_KEY: &str = "GPSInfo";

pub const DIVISION_BY_ZERO: &str = "division by zero";

#[derive(Debug, Default)]
pub struct NormalizedExif {
    pub tags: ExifMap,
    pub gps: GpsBlock,
}

/// Builds the tag-name map for the primary image from decoded EXIF fields.
///
/// GPS IFD fields are normalized into a nested map under [`GPS_INFO_KEY`] and
/// also kept raw in `gps` for the coordinate decoder. Thumbnail fields are
/// ignored.
pub fn normalize_fields<'a, I>(fields: I) -> NormalizedExif
where
    I: IntoIterator<Item = &'a Field>,
{
    let mut normalized = NormalizedExif::default();
    let mut gps_tags = ExifMap::new();

    for field in fields {
        if field.ifd_num != In::PRIMARY {
            continue;
        }
        let name = tag_name(field.tag);
        let value = normalize_value(field.tag, &field.value);
        if let ExifValue::Unrepresentable(reason) = &value {
            log::debug!("Could not convert EXIF tag {}: {}", name, reason);
        }

        if field.tag.context() == Context::Gps {
            normalized.gps.insert(field.tag, field.value.clone());
            gps_tags.insert(name, value);
        } else {
            normalized.tags.insert(name, value);
        }
    }

    if !gps_tags.is_empty() {
        normalized
            .tags
            .insert(GPS_INFO_KEY.to_string(), ExifValue::Nested(gps_tags));
    }
    normalized
}

/// Standard tag name, or the decimal tag number for tags the table lacks.
pub fn tag_name(tag: Tag) -> String {
    match tag.description() {
        Some(_) => tag.to_string(),
        None => tag.number().to_string(),
    }
}

pub fn normalize_value(tag: Tag, value: &Value) -> ExifValue {
    match value {
        Value::Rational(v) if v.len() == 1 => ratio(v[0].num as f64, v[0].denom as f64),
        Value::SRational(v) if v.len() == 1 => ratio(v[0].num as f64, v[0].denom as f64),
        Value::Byte(v) if v.len() == 1 => ExifValue::Integer(v[0] as i64),
        Value::Short(v) if v.len() == 1 => ExifValue::Integer(v[0] as i64),
        Value::Long(v) if v.len() == 1 => ExifValue::Integer(v[0] as i64),
        Value::SByte(v) if v.len() == 1 => ExifValue::Integer(v[0] as i64),
        Value::SShort(v) if v.len() == 1 => ExifValue::Integer(v[0] as i64),
        Value::SLong(v) if v.len() == 1 => ExifValue::Integer(v[0] as i64),
        Value::Float(v) if v.len() == 1 => finite(v[0] as f64),
        Value::Double(v) if v.len() == 1 => finite(v[0]),
        Value::Ascii(v) if v.len() == 1 => ExifValue::Text(ascii_text(&v[0])),
        Value::Unknown(typ, _, _) => {
            ExifValue::Unrepresentable(format!("unsupported value type {}", typ))
        }
        _ => ExifValue::Text(value.display_as(tag).to_string()),
    }
}

fn ratio(num: f64, denom: f64) -> ExifValue {
    if denom == 0.0 {
        ExifValue::Unrepresentable(DIVISION_BY_ZERO.to_string())
    } else {
        ExifValue::Float(num / denom)
    }
}

fn finite(f: f64) -> ExifValue {
    if f.is_finite() {
        ExifValue::Float(f)
    } else {
        ExifValue::Unrepresentable("non-finite float".to_string())
    }
}

fn ascii_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
