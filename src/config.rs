use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::options::ThumbnailOptions;
use crate::request::{DEFAULT_THUMBNAIL_SIZE, ThumbnailRequest};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub options: ThumbnailOptions,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_THUMBNAIL_SIZE,
            height: DEFAULT_THUMBNAIL_SIZE,
            options: ThumbnailOptions::NONE,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Build a request for `file` using the configured size and flags.
    pub fn request_for<P: AsRef<Path>>(&self, file: P) -> ThumbnailRequest {
        ThumbnailRequest::with_dimensions(file, self.width, self.height).options(self.options)
    }

    /// Where the PNG for `file` is written.
    pub fn output_path(&self, file: &Path) -> PathBuf {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "thumbnail".to_string());
        self.output_dir.join(format!("{stem}.png"))
    }
}

/// Read the config file. A missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    if !path.as_ref().exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThumbnailError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!((config.width, config.height), (256, 256));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "width": 100, "height": 50, "options": "BIGGER_SIZE_OK | THUMBNAIL_ONLY" }"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!((config.width, config.height), (100, 50));
        assert_eq!(
            config.options,
            ThumbnailOptions::BIGGER_SIZE_OK | ThumbnailOptions::THUMBNAIL_ONLY
        );
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(ThumbnailError::Config(_))));
    }

    #[test]
    fn test_request_and_output_path() {
        let config = Config {
            width: 64,
            height: 32,
            options: ThumbnailOptions::ICON_ONLY,
            output_dir: PathBuf::from("out"),
        };
        let req = config.request_for("docs/report.pdf");
        assert_eq!((req.width(), req.height()), (64, 32));
        assert_eq!(req.flags(), ThumbnailOptions::ICON_ONLY);
        assert_eq!(
            config.output_path(Path::new("docs/report.pdf")),
            PathBuf::from("out").join("report.png")
        );
    }
}
