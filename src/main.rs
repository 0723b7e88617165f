mod config;
mod error;
mod gps;
mod hashing;
mod metadata;
mod normalizer;
mod output;
mod processor;
mod timestamp;
mod walker;

use crate::config::{AppConfig, Cli};
use crate::error::AppError;
use anyhow::Result;
use clap::Parser;
use log::info;
use std::io::{BufRead, Write};
use std::path::PathBuf;

fn prompt_for_directory() -> Result<PathBuf, AppError> {
    print!("Enter the path to the directory containing images: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        return Err(AppError::Generic("no directory given".to_string()));
    }
    Ok(PathBuf::from(line))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::new(&cli)?;

    // Initialize env_logger based on config.log_level
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting image-metadata");

    let scan_dir = match &config.scan_directory {
        Some(dir) => PathBuf::from(dir),
        None => prompt_for_directory()?,
    };

    let paths = walker::start_walking(&config, &scan_dir)?;
    let collection = processor::start_processing(&config, paths);
    let outcome = output::start_output(&config, &scan_dir, collection)?;
    match outcome {
        output::Outcome::Empty => info!("No metadata extracted from {}", scan_dir.display()),
        output::Outcome::Written { records, file } => match file {
            Some(file) => info!("Wrote {} record(s) to {}", records, file.display()),
            None => info!("Extracted {} record(s)", records),
        },
    }

    info!("Image-metadata finished");

    Ok(())
}
