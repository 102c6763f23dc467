//! Scan orchestration: matrix → storage → capture → compare → summary
//!
//! Targets run one after another on a single renderer. A failed comparison is
//! logged and recorded but does not stop the scan; a failed capture aborts it.

use crate::capture::{capture, Renderer};
use crate::catalog::{self, Environment, DEFAULT_THEME};
use crate::compare::Comparator;
use crate::matrix::build_matrix;
use crate::storage::ArtifactStore;
use crate::types::{
    CompareMode, ImageArtifactPaths, MatrixEntry, ScanError, ScanFailure, ScanSummary, TargetSpec,
};
use crate::Result;
use tracing::{error, info, warn};

/// What to scan
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub template: String,
    pub environment: Environment,
    pub theme: String,
    pub partner: bool,
    pub screen: Option<String>,
    pub device: Option<String>,

    /// Accept every capture as the new baseline
    pub approve: bool,
}

impl ScanRequest {
    pub fn new(template: impl Into<String>, environment: Environment) -> Self {
        Self {
            template: template.into(),
            environment,
            theme: DEFAULT_THEME.to_string(),
            partner: false,
            screen: None,
            device: None,
            approve: false,
        }
    }

    pub fn matrix(&self) -> Vec<MatrixEntry> {
        build_matrix(self.partner, self.screen.as_deref(), self.device.as_deref())
    }

    fn target(&self, entry: &MatrixEntry) -> TargetSpec {
        TargetSpec {
            template: self.template.clone(),
            screen: entry.screen.clone(),
            device: entry.device.clone(),
            theme: self.theme.clone(),
            environment: self.environment,
        }
    }
}

pub struct Scanner {
    store: ArtifactStore,
    comparator: Comparator,
}

impl Scanner {
    pub fn new(store: ArtifactStore, comparator: Comparator) -> Self {
        Self { store, comparator }
    }

    /// Run every target of the request in matrix order.
    ///
    /// Capture errors are returned immediately; everything else ends up in the
    /// summary.
    pub fn run<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        request: &ScanRequest,
    ) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();

        for entry in request.matrix() {
            let Some(viewport) = catalog::viewport_for(&entry.device) else {
                error!("❌ Unknown device: {}", entry.device);
                if !summary.skipped.contains(&entry.device) {
                    summary.skipped.push(entry.device.clone());
                }
                continue;
            };

            let target = request.target(&entry);
            let paths = self
                .store
                .resolve(&target.template, &target.screen, &target.device)?;

            info!(
                "🔍 Checking: {} / {} / {} / theme={} ({}x{})",
                target.template,
                target.screen,
                target.device,
                target.theme,
                viewport.width,
                viewport.height
            );

            capture(renderer, &target.url(), viewport, &paths.current)?;

            if request.approve {
                self.approve(&entry, &paths, &mut summary)?;
                continue;
            }

            match self.comparator.compare(&paths, CompareMode::Check) {
                Ok(result) if result.changed => {
                    error!(
                        "❌ Design changed! Different pixels: {}",
                        result.diff_pixel_count
                    );
                    info!("💡 See \"{}\" for highlighted differences", paths.diff.display());
                    summary.changed.push(ScanFailure {
                        screen: entry.screen,
                        device: entry.device,
                    });
                }
                Ok(result) => match result.message {
                    Some(message) => info!("✅ {}", message),
                    None => info!("✅ No difference detected"),
                },
                Err(e) => {
                    error!("Error comparing images: {}", e);
                    summary.errors.push(ScanError {
                        screen: entry.screen,
                        device: entry.device,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Promote the capture to baseline, then refresh the diff artifact.
    fn approve(
        &self,
        entry: &MatrixEntry,
        paths: &ImageArtifactPaths,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        std::fs::copy(&paths.current, &paths.baseline)?;
        info!("✅ Changes approved, baseline updated");

        if let Err(e) = self.comparator.compare(paths, CompareMode::Approve) {
            warn!("Could not refresh diff after approval: {}", e);
            summary.errors.push(ScanError {
                screen: entry.screen.clone(),
                device: entry.device.clone(),
                message: e.to_string(),
            });
        }

        Ok(())
    }
}
