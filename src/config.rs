use crate::error::AppError;
use crate::hashing::HashAlgorithm;
use crate::timestamp::TimestampZone;
use clap::{Parser, ValueEnum};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff"];
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "image_metadata.json";

/// What to do with a record whose content hashes could not be computed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HashFailurePolicy {
    /// Keep the record, leave the hashes out.
    OmitHashes,
    /// Drop the whole record.
    SkipRecord,
}

/// Extract image metadata from a directory and dump it as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the images; prompted for when omitted
    pub directory: Option<PathBuf>,

    /// Write the JSON document here instead of <DIRECTORY>/image_metadata.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write the JSON document to disk
    #[arg(long)]
    pub no_file: bool,

    /// Do not print the JSON document to stdout
    #[arg(short, long)]
    pub quiet: bool,

    /// Sort entries by file name for deterministic output
    #[arg(long)]
    pub sort: bool,

    /// Format file timestamps in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Digest to compute; repeat for several
    #[arg(long = "hash", value_enum)]
    pub hashes: Vec<HashAlgorithm>,

    #[arg(long, value_enum)]
    pub hash_failure: Option<HashFailurePolicy>,

    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scan_directory: Option<String>,
    pub allowed_extensions: HashSet<String>,
    pub output_file_name: String,
    pub output_path: Option<String>,
    pub write_file: bool,
    pub print_json: bool,
    pub sort_entries: bool,
    pub hash_algorithms: Vec<HashAlgorithm>,
    pub hash_failure: HashFailurePolicy,
    pub timestamp_zone: TimestampZone,
    pub log_level: String,
}

impl AppConfig {
    pub fn new(cli: &Cli) -> Result<Self, AppError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("allowed_extensions", DEFAULT_EXTENSIONS.to_vec())?
            .set_default("output_file_name", DEFAULT_OUTPUT_FILE_NAME)?
            .set_default("write_file", true)?
            .set_default("print_json", true)?
            .set_default("sort_entries", false)?
            .set_default("hash_algorithms", vec!["md5", "sha256"])?
            .set_default("hash_failure", "omit_hashes")?
            .set_default("timestamp_zone", "local")?
            .set_default("log_level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("IMAGE_METADATA")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("hash_algorithms")
                    .with_list_parse_key("allowed_extensions"),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_cli(cli);
        config.allowed_extensions = config
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.directory {
            self.scan_directory = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(output) = &cli.output {
            self.output_path = Some(output.to_string_lossy().into_owned());
        }
        if cli.no_file {
            self.write_file = false;
        }
        if cli.quiet {
            self.print_json = false;
        }
        if cli.sort {
            self.sort_entries = true;
        }
        if cli.utc {
            self.timestamp_zone = TimestampZone::Utc;
        }
        if !cli.hashes.is_empty() {
            self.hash_algorithms = cli.hashes.clone();
        }
        if let Some(policy) = cli.hash_failure {
            self.hash_failure = policy;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
    }

    /// Where the JSON document for `scan_dir` goes.
    pub fn output_file(&self, scan_dir: &std::path::Path) -> PathBuf {
        match &self.output_path {
            Some(path) => PathBuf::from(path),
            None => scan_dir.join(&self.output_file_name),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan_directory: None,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            output_path: None,
            write_file: true,
            print_json: true,
            sort_entries: false,
            hash_algorithms: vec![HashAlgorithm::Md5, HashAlgorithm::Sha256],
            hash_failure: HashFailurePolicy::OmitHashes,
            timestamp_zone: TimestampZone::Local,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    // Tests that touch IMAGE_METADATA_* variables hold this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "image-metadata",
            "/photos",
            "--no-file",
            "--sort",
            "--utc",
            "--hash",
            "sha256",
            "--hash-failure",
            "skip-record",
        ]);
        let mut config = AppConfig::default();
        config.apply_cli(&cli);

        assert_eq!(config.scan_directory.as_deref(), Some("/photos"));
        assert!(!config.write_file);
        assert!(config.print_json);
        assert!(config.sort_entries);
        assert_eq!(config.timestamp_zone, TimestampZone::Utc);
        assert_eq!(config.hash_algorithms, vec![HashAlgorithm::Sha256]);
        assert_eq!(config.hash_failure, HashFailurePolicy::SkipRecord);
    }

    #[test]
    fn output_file_defaults_to_scan_directory() {
        let config = AppConfig::default();
        assert_eq!(
            config.output_file(Path::new("/photos")),
            Path::new("/photos/image_metadata.json")
        );

        let config = AppConfig {
            output_path: Some("/tmp/out.json".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.output_file(Path::new("/photos")), Path::new("/tmp/out.json"));
    }

    #[test]
    fn environment_lists_are_split_on_commas() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("IMAGE_METADATA_HASH_ALGORITHMS", "md5,blake3");
        std::env::set_var("IMAGE_METADATA_ALLOWED_EXTENSIONS", ".PNG,webp");
        let config = AppConfig::new(&Cli::parse_from(["image-metadata"]));
        std::env::remove_var("IMAGE_METADATA_HASH_ALGORITHMS");
        std::env::remove_var("IMAGE_METADATA_ALLOWED_EXTENSIONS");

        let config = config.unwrap();
        assert_eq!(config.hash_algorithms, vec![HashAlgorithm::Md5, HashAlgorithm::Blake3]);
        let mut extensions: Vec<_> = config.allowed_extensions.iter().cloned().collect();
        extensions.sort();
        assert_eq!(extensions, ["png", "webp"]);
    }

    #[test]
    fn invalid_setting_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("IMAGE_METADATA_HASH_FAILURE", "sometimes");
        let result = AppConfig::new(&Cli::parse_from(["image-metadata"]));
        std::env::remove_var("IMAGE_METADATA_HASH_FAILURE");

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn default_extensions_cover_all_variants() {
        let config = AppConfig::default();
        for ext in ["png", "jpg", "jpeg", "gif", "bmp", "tiff"] {
            assert!(config.allowed_extensions.contains(ext));
        }
    }
}
