//! Static lookup tables: screen catalogs, device viewports and environments.

use crate::types::Viewport;
use crate::VisionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Screens rendered for partner templates, in presentation order.
pub const PARTNER_SCREENS: &[&str] = &[
    "search",
    "credentials",
    "provider_and_consent_skipped",
    "consent",
    "override",
    "stage",
    "interactive_app_redirect",
    "interactive_otp",
    "interactive_captcha",
    "interactive_checkboxes",
    "interactive_with_optional",
    "success",
    "errors",
    "init_error",
    "gdpr_warning",
    "kyc_simplified",
    "kyc_standard",
];

/// Screens rendered for non-partner templates (no GDPR/KYC screens).
pub const STANDARD_SCREENS: &[&str] = &[
    "search",
    "credentials",
    "provider_and_consent_skipped",
    "consent",
    "override",
    "stage",
    "interactive_app_redirect",
    "interactive_otp",
    "interactive_captcha",
    "interactive_checkboxes",
    "interactive_with_optional",
    "success",
    "errors",
    "init_error",
];

/// Device name to viewport, in matrix order.
pub const DEVICES: &[(&str, Viewport)] = &[
    ("desktop", Viewport::new(1440, 900)),
    ("mobile320", Viewport::new(320, 580)),
    ("mobile360", Viewport::new(360, 768)),
    ("mobile414", Viewport::new(414, 896)),
];

pub const DEFAULT_THEME: &str = "light";

/// Path and fixed query of the preview frame.
pub const PREVIEW_PATH: &str =
    "/admin/previews/connect/frame?customization=off&locale=en&mode=all";

pub fn screens(partner: bool) -> &'static [&'static str] {
    if partner {
        PARTNER_SCREENS
    } else {
        STANDARD_SCREENS
    }
}

pub fn device_names() -> impl Iterator<Item = &'static str> {
    DEVICES.iter().map(|(name, _)| *name)
}

pub fn viewport_for(device: &str) -> Option<Viewport> {
    DEVICES
        .iter()
        .find(|(name, _)| *name == device)
        .map(|(_, viewport)| *viewport)
}

/// Deployment the preview pages are served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Localhost,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Localhost,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Localhost => "http://localhost:5000",
            Environment::Staging => "https://www.banksalt.com",
            Environment::Production => "https://www.saltedge.com",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Localhost => "localhost",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Parse an environment name, falling back to the default with a warning.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            let fallback = Environment::default();
            tracing::warn!(
                "Unknown env \"{}\", defaulting to {}",
                value,
                fallback.name()
            );
            fallback
        })
    }
}

impl FromStr for Environment {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.name() == s)
            .ok_or_else(|| VisionError::UnknownEnvironment(s.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
