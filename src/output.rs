use crate::config::AppConfig;
use crate::error::AppError;
use crate::metadata::MetadataCollection;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};

pub const EMPTY_NOTICE: &str = "No images found in the specified directory.";

#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Nothing qualified; the notice was printed instead of JSON.
    Empty,
    Written {
        records: usize,
        file: Option<PathBuf>,
    },
}

/// JSON array of the records, indented with four spaces.
pub fn render_json(collection: &MetadataCollection) -> Result<String, AppError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    collection.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| AppError::Generic(e.to_string()))
}

/// Prints and/or saves the collection as configured.
///
/// The document is rendered before anything is written, so a serialization
/// failure leaves no partial file behind.
pub fn start_output(
    config: &AppConfig,
    scan_dir: &Path,
    collection: MetadataCollection,
) -> Result<Outcome, AppError> {
    if collection.is_empty() {
        println!("{}", EMPTY_NOTICE);
        return Ok(Outcome::Empty);
    }

    log::debug!(
        "Rendering {} record(s), {} with GPS data",
        collection.len(),
        collection.iter().filter(|r| r.gps.is_some()).count()
    );
    let json = render_json(&collection)?;

    if config.print_json {
        println!("{}", json);
    }

    let file = if config.write_file {
        let path = config.output_file(scan_dir);
        std::fs::write(&path, json.as_bytes())?;
        log::info!("Metadata saved to {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(Outcome::Written {
        records: collection.len(),
        file,
    })
}
