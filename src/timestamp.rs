//! Human-readable file timestamps.
//!
//! File "creation" time is the file system birth time where the platform
//! records one. Unix file systems without birth time fall back to the inode
//! change time, which is updated by `chmod` and renames, so it is only an
//! approximation of when the file was created.

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    Local,
    Utc,
}

/// Formats `secs` since the Unix epoch as `YYYY-MM-DD HH:MM:SS`.
///
/// Values outside chrono's representable range are rendered as the raw
/// number of seconds.
pub fn format_timestamp(secs: i64, zone: TimestampZone) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(utc) => match zone {
            TimestampZone::Utc => utc.format(TIMESTAMP_FORMAT).to_string(),
            TimestampZone::Local => utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
        },
        None => secs.to_string(),
    }
}

pub fn format_system_time(time: SystemTime, zone: TimestampZone) -> String {
    let secs = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(e) => -(e.duration().as_secs_f64().ceil() as i64),
    };
    format_timestamp(secs, zone)
}

pub fn created(metadata: &Metadata) -> Option<SystemTime> {
    if let Ok(time) = metadata.created() {
        return Some(time);
    }
    change_time(metadata)
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;

    let secs = metadata.ctime();
    if secs >= 0 {
        Some(UNIX_EPOCH + Duration::new(secs as u64, metadata.ctime_nsec() as u32))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
    }
}

#[cfg(not(unix))]
fn change_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_epoch_seconds_in_utc() {
        assert_eq!(format_timestamp(0, TimestampZone::Utc), "1970-01-01 00:00:00");
        assert_eq!(
            format_timestamp(1_700_000_000, TimestampZone::Utc),
            "2023-11-14 22:13:20"
        );
        assert_eq!(format_timestamp(-1, TimestampZone::Utc), "1969-12-31 23:59:59");
    }

    #[test]
    fn local_zone_keeps_the_pattern() {
        let formatted = format_timestamp(1_700_000_000, TimestampZone::Local);
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
        assert_eq!(&formatted[4..5], "-");
        assert_eq!(&formatted[13..14], ":");
    }

    #[test]
    fn out_of_range_falls_back_to_seconds() {
        assert_eq!(format_timestamp(i64::MAX, TimestampZone::Utc), i64::MAX.to_string());
    }

    #[test]
    fn system_time_drops_sub_second_precision() {
        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_999);
        assert_eq!(format_system_time(time, TimestampZone::Utc), "2023-11-14 22:13:20");
    }

    #[test]
    fn file_metadata_has_a_creation_time() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let metadata = file.as_file().metadata().unwrap();
        if cfg!(unix) {
            assert!(created(&metadata).is_some());
        }
    }
}
