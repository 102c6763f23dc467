use crate::compare::CompareOptions;
use crate::session::SESSION_TTL_HOURS;
use crate::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "connect-vision.config.json";

/// Connect Vision configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root of the baseline/current/diff image tree
    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,

    /// Directory of the per-environment cookie caches
    #[serde(default = "default_cookies_dir")]
    pub cookies_dir: PathBuf,

    /// Perceptual threshold of the pixel diff (0 to 1)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Mismatched pixels tolerated before a screen counts as changed
    #[serde(default = "default_max_diff_pixels")]
    pub max_diff_pixels: u64,

    /// Lifetime of cached login cookies
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_cookies_dir() -> PathBuf {
    PathBuf::from("cookies")
}

fn default_threshold() -> f64 {
    CompareOptions::default().threshold
}

fn default_max_diff_pixels() -> u64 {
    CompareOptions::default().max_diff_pixels
}

fn default_session_ttl_hours() -> i64 {
    SESSION_TTL_HOURS
}

impl Config {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_file(&dir.join(DEFAULT_CONFIG_NAME))
    }

    /// Load config from an explicit path, falling back to defaults when absent
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| VisionError::Config(format!("{}: {}", path.display(), e)))?;

        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(VisionError::Config(format!(
                "threshold must be between 0 and 1, got {}",
                config.threshold
            )));
        }

        Ok(config)
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            threshold: self.threshold,
            max_diff_pixels: self.max_diff_pixels,
        }
    }

    /// Resolve a configured directory against `base` unless it is absolute
    pub fn resolve_dir(&self, base: &Path, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screenshots_dir: default_screenshots_dir(),
            cookies_dir: default_cookies_dir(),
            threshold: default_threshold(),
            max_diff_pixels: default_max_diff_pixels(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}
