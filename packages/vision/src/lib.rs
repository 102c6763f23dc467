//! # Connect Vision
//!
//! Visual regression checks for the connect preview screens.
//!
//! Every (screen, device) pair of a template is rendered in a browser, captured as a
//! full-page screenshot and compared against a stored baseline. Differences beyond a
//! small noise budget are reported; approval mode promotes the current captures to
//! baselines.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use connect_vision::{
//!     ArtifactStore, ChromeRenderer, Comparator, CompareOptions, Environment, ScanRequest,
//!     Scanner,
//! };
//!
//! let mut renderer = ChromeRenderer::launch(false).unwrap();
//! let store = ArtifactStore::new("screenshots");
//! let scanner = Scanner::new(store, Comparator::new(CompareOptions::default()));
//!
//! let request = ScanRequest::new("demo", Environment::Localhost);
//! let summary = scanner.run(&mut renderer, &request).unwrap();
//!
//! for failure in &summary.changed {
//!     println!("{} on {}", failure.screen, failure.device);
//! }
//! ```

pub mod catalog;
mod capture;
mod compare;
mod config;
mod matrix;
pub mod pixelmatch;
mod scan;
mod session;
mod storage;
mod types;

pub use capture::{capture, ChromeRenderer, Renderer};
pub use catalog::Environment;
pub use compare::{normalize_to, Comparator, CompareOptions, BASELINE_CREATED};
pub use config::{Config, DEFAULT_CONFIG_NAME};
pub use matrix::build_matrix;
pub use scan::{ScanRequest, Scanner};
pub use session::{FileSessionStore, Session, SessionStore, StoredCookie, SESSION_TTL_HOURS};
pub use storage::ArtifactStore;
pub use types::{
    CompareMode, ComparisonResult, ImageArtifactPaths, MatrixEntry, ScanError, ScanFailure,
    ScanSummary, TargetSpec, Viewport,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Image sizes differ: {expected:?} vs {actual:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
}

pub type Result<T> = std::result::Result<T, VisionError>;
