use crate::config::{AppConfig, HashFailurePolicy};
use crate::error::AppError;
use crate::gps;
use crate::hashing;
use crate::metadata::{ExifMap, ImageRecord, MetadataCollection};
use crate::normalizer;
use crate::timestamp;
use exif::Reader;
use image::{ColorType, ImageFormat};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Runs the extractor over every path in order. Files that fail are logged
/// and left out; nothing here aborts the batch.
pub fn start_processing(config: &AppConfig, paths: Vec<PathBuf>) -> MetadataCollection {
    log::debug!("Received {} paths for processing.", paths.len());

    let mut collection = MetadataCollection::new();
    for path in paths {
        log::info!("Processing image: {}", path.display());
        match process_image(config, &path) {
            Ok(record) => {
                log::trace!("Extracted metadata for {:?}: {:?}", path, record);
                collection.push(record);
            }
            Err(e) => {
                log::warn!("Error extracting metadata from {}: {}", path.display(), e);
            }
        }
    }

    log::info!("Extracted metadata from {} image(s).", collection.len());
    collection
}

pub fn process_image(config: &AppConfig, path: &Path) -> Result<ImageRecord, AppError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let mut record = ImageRecord::new(filename);

    log::trace!("Decoding image: {:?}", path);
    let (format, image) = {
        let reader = image::io::Reader::open(path)?.with_guessed_format()?;
        let format = reader.format();
        (format, reader.decode()?)
    };
    record.format = format.map(format_name);
    record.mode = Some(color_mode(image.color()));
    record.size = Some((image.width(), image.height()));
    drop(image);
    log::debug!("{:?}: {:?} {:?} {:?}", path, record.format, record.mode, record.size);

    match std::fs::metadata(path) {
        Ok(metadata) => {
            let zone = config.timestamp_zone;
            record.created = timestamp::created(&metadata)
                .map(|time| timestamp::format_system_time(time, zone));
            record.modified = metadata
                .modified()
                .ok()
                .map(|time| timestamp::format_system_time(time, zone));
        }
        Err(e) => log::warn!("Could not read file timestamps for {}: {}", path.display(), e),
    }

    let exif = match format {
        Some(format) if container_carries_exif(format) => read_exif(path),
        _ => Ok(None),
    };
    match exif {
        Ok(Some(exif)) => {
            let normalized = normalizer::normalize_fields(exif.fields());
            if !normalized.gps.is_empty() {
                record.gps = gps::decode(&normalized.gps);
                if record.gps.is_none() {
                    log::debug!("GPS block in {} has no usable coordinates", path.display());
                }
            }
            record.exif = Some(normalized.tags);
        }
        Ok(None) => {
            log::info!("No EXIF data found for {}", path.display());
            record.exif = Some(ExifMap::new());
        }
        Err(e) => log::warn!("Could not read EXIF data from {}: {}", path.display(), e),
    }

    if !config.hash_algorithms.is_empty() {
        let hashed = hashing::hash_file(path, &config.hash_algorithms);
        record.hashes = apply_hash_policy(config.hash_failure, path, hashed)?;
    }

    Ok(record)
}

/// `Err` only when the policy says the record must be dropped.
fn apply_hash_policy(
    policy: HashFailurePolicy,
    path: &Path,
    hashed: Result<BTreeMap<String, String>, AppError>,
) -> Result<Option<BTreeMap<String, String>>, AppError> {
    match hashed {
        Ok(hashes) => Ok(Some(hashes)),
        Err(e) => match policy {
            HashFailurePolicy::OmitHashes => {
                log::warn!("Could not hash {}: {}", path.display(), e);
                Ok(None)
            }
            HashFailurePolicy::SkipRecord => Err(e),
        },
    }
}

/// `Ok(None)` when the container holds no EXIF block.
fn read_exif(path: &Path) -> Result<Option<exif::Exif>, AppError> {
    log::trace!("Extracting EXIF data for image: {:?}", path);
    let file = File::open(path)?;
    let mut buf_reader = BufReader::new(file);
    match Reader::new().read_from_container(&mut buf_reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn container_carries_exif(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff)
}

pub fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Ico => "ICO".to_string(),
        ImageFormat::Pnm => "PPM".to_string(),
        ImageFormat::OpenExr => "EXR".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

pub fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L".to_string(),
        ColorType::La8 => "LA".to_string(),
        ColorType::Rgb8 => "RGB".to_string(),
        ColorType::Rgba8 => "RGBA".to_string(),
        ColorType::L16 => "I;16".to_string(),
        ColorType::La16 => "LA;16".to_string(),
        ColorType::Rgb16 => "RGB;16".to_string(),
        ColorType::Rgba16 => "RGBA;16".to_string(),
        ColorType::Rgb32F => "RGB;F".to_string(),
        ColorType::Rgba32F => "RGBA;F".to_string(),
        other => format!("{:?}", other),
    }
}
