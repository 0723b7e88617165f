use crate::config::AppConfig;
use crate::error::AppError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the files directly inside `dir` whose extension is allowed.
///
/// Order is whatever the file system returns unless `sort_entries` is set.
/// Fails only when `dir` itself cannot be enumerated.
pub fn start_walking(config: &AppConfig, dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    log::info!("Scanning directory: {}", dir.display());
    log::debug!("Configured allowed extensions: {:?}", config.allowed_extensions);

    match std::fs::metadata(dir) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(AppError::NotADirectory(dir.to_path_buf()))
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(dir.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    }

    let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true);
    if config.sort_entries {
        walker = walker.sort_by_file_name();
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", path);
            continue;
        }
        if has_allowed_extension(config, path) {
            log::debug!("Found image candidate: {:?}", path);
            paths.push(path.to_path_buf());
        } else {
            log::trace!("Skipping file due to unsupported extension: {:?}", path);
        }
    }

    log::info!("Found {} candidate image(s).", paths.len());
    Ok(paths)
}

fn has_allowed_extension(config: &AppConfig, path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| config.allowed_extensions.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::start_processing;
    use crate::processor::tests::write_png;

    fn sorted_config() -> AppConfig {
        AppConfig {
            sort_entries: true,
            ..AppConfig::default()
        }
    }

    #[test]
    fn filters_by_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.JPG", "c.Tiff", "notes.txt", "no_extension"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let paths = start_walking(&sorted_config(), dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.png", "b.JPG", "c.Tiff"]);
    }

    #[test]
    fn does_not_recurse() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("deep.png"), b"x").unwrap();

        assert!(start_walking(&sorted_config(), dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            start_walking(&sorted_config(), &missing),
            Err(AppError::NotFound(_))
        ));

        let file = dir.path().join("file.png");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            start_walking(&sorted_config(), &file),
            Err(AppError::NotADirectory(_))
        ));
    }

    #[test]
    fn three_images_two_others_and_a_corrupt_one() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("one.png"));
        write_png(&dir.path().join("two.png"));
        crate::processor::tests::write_jpeg_with_exif(&dir.path().join("three.jpg"));
        std::fs::write(dir.path().join("readme.md"), b"# photos").unwrap();
        std::fs::write(dir.path().join("data.csv"), b"a,b").unwrap();
        std::fs::write(dir.path().join("corrupt.gif"), b"GIF89a garbage").unwrap();

        let config = sorted_config();
        let paths = start_walking(&config, dir.path()).unwrap();
        assert_eq!(paths.len(), 4);

        let collection = start_processing(&config, paths);
        let names: Vec<&str> = collection.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["one.png", "three.jpg", "two.png"]);
    }
}
