//! Core types for Connect Vision

use crate::catalog::{Environment, PREVIEW_PATH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Viewport dimensions for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One (screen, device) cell of the scan matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixEntry {
    pub screen: String,
    pub device: String,
}

impl MatrixEntry {
    pub fn new(screen: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            device: device.into(),
        }
    }
}

/// A single rendering under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub template: String,
    pub screen: String,
    pub device: String,
    pub theme: String,
    pub environment: Environment,
}

impl TargetSpec {
    /// Preview frame URL for this target
    pub fn url(&self) -> String {
        format!(
            "{}{}&theme={}&connect_template={}&screen={}",
            self.environment.base_url(),
            PREVIEW_PATH,
            self.theme,
            self.template,
            self.screen
        )
    }
}

/// Where the three images of a target live on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifactPaths {
    pub baseline: PathBuf,
    pub current: PathBuf,
    pub diff: PathBuf,
}

/// How the comparator treats a clean comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    /// Report only
    #[default]
    Check,

    /// Promote `current` to baseline when no change is detected
    Approve,
}

/// Outcome of comparing a capture against its baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub changed: bool,
    pub diff_pixel_count: u64,

    /// Only set when the baseline was created by this comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub screen: String,
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    pub screen: String,
    pub device: String,
    pub message: String,
}

/// Result of one scan run, in matrix order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Targets whose capture differs from the baseline
    pub changed: Vec<ScanFailure>,

    /// Targets whose comparison failed
    pub errors: Vec<ScanError>,

    /// Requested devices with no known viewport
    pub skipped: Vec<String>,
}

impl ScanSummary {
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty() && self.errors.is_empty()
    }
}
